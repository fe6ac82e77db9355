//! Batch asset sweep
//!
//! ```text
//! SweepRequest → validate_request → SweepOrchestrator ──→ AssetLedger
//!                                        │
//!                                        └──→ EventSink (TransferCompleted, BatchCompleted)
//! ```
//!
//! Per-entry failures never escape `sweep_asset`; they show up only as
//! `success = false` outcomes in the [`BatchSummary`].

pub mod events;
pub mod guard;
pub mod orchestrator;
pub mod request;
pub mod types;
pub mod validator;

pub use events::{EventSink, FanoutEventSink, MemoryEventSink, TracingEventSink};
pub use guard::SweepGuard;
pub use orchestrator::SweepOrchestrator;
pub use request::{SourceAccount, SweepRequest, SweepRequestFile};
pub use types::{
    BatchSummary, EntryFailure, EntryOutcome, PlannedEntry, SweepEvent, SweepPlan,
};
pub use validator::{validate_request, RequestLimits};
