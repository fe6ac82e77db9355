//! Asset ledger capability
//!
//! Every balance, authorization and transfer the sweeper performs goes
//! through [`AssetLedger`]. Implementations are untrusted: any call may fail,
//! return garbage, or try to call back into the sweeper.
//!
//! # Implementations
//!
//! - [`SplTokenLedger`]: SPL token accounts over a blocking RPC client
//! - `MockLedger` (tests only): scripted balances, failures and reentry

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use thiserror::Error;

pub mod spl;

#[cfg(test)]
pub mod mock;

pub use spl::{SplLedgerConfig, SplTokenLedger};

/// Account identifier (token owner or destination wallet)
pub type AccountId = Pubkey;

/// Asset identifier (token mint). The all-zero key is the null sentinel.
pub type AssetId = Pubkey;

/// Failure of a single ledger call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Malformed ledger data: {0}")]
    Malformed(String),

    #[error("Ledger rejected call: {0}")]
    Rejected(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Balance/authorization/transfer operations for fungible assets
pub trait AssetLedger: Send + Sync {
    /// Balance of `asset` held by `account`, in base units
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Result<u64, LedgerError>;

    /// Amount of `asset` that `owner` has authorized `spender` to move
    fn authorized_amount(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
    ) -> Result<u64, LedgerError>;

    /// Move `amount` of `asset` from `from` to `to`.
    ///
    /// `Ok(false)` is an explicit rejection and is treated the same as `Err`.
    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
        asset: &AssetId,
    ) -> Result<bool, LedgerError>;
}

impl<L: AssetLedger + ?Sized> AssetLedger for Arc<L> {
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Result<u64, LedgerError> {
        (**self).balance_of(account, asset)
    }

    fn authorized_amount(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
    ) -> Result<u64, LedgerError> {
        (**self).authorized_amount(owner, spender, asset)
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
        asset: &AssetId,
    ) -> Result<bool, LedgerError> {
        (**self).transfer(from, to, amount, asset)
    }
}

/// Check whether an identifier is the null sentinel
pub fn is_null(id: &Pubkey) -> bool {
    *id == Pubkey::default()
}
