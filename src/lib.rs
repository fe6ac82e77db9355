//! Token Sweeper Library
//!
//! Batch sweep of delegated SPL token balances from many owners into a
//! single destination, with per-entry failure isolation.

pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod report;
pub mod sweep;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{AssetLedger, LedgerError};
pub use sweep::{BatchSummary, SweepOrchestrator, SweepRequest};
