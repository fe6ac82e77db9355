//! Sweep outcome types
//!
//! Per-entry outcomes, the batch summary, dry-run plans and events.

use serde::Serialize;

use crate::ledger::{AccountId, AssetId};

/// Why a single (account, asset) entry moved nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryFailure {
    /// Balance query errored
    BalanceQueryFailed,
    /// Account holds none of the asset
    ZeroBalance,
    /// Authorization query errored
    AuthorizationQueryFailed,
    /// Account authorized nothing for the sweeper
    ZeroAuthorization,
    /// Transfer call errored
    TransferFailed,
    /// Transfer call returned an explicit non-success
    TransferRejected,
    /// Transfer was sent but its result is unknown; it may still land
    TransferUnconfirmed,
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryFailure::BalanceQueryFailed => write!(f, "balance query failed"),
            EntryFailure::ZeroBalance => write!(f, "zero balance"),
            EntryFailure::AuthorizationQueryFailed => write!(f, "authorization query failed"),
            EntryFailure::ZeroAuthorization => write!(f, "zero authorization"),
            EntryFailure::TransferFailed => write!(f, "transfer failed"),
            EntryFailure::TransferRejected => write!(f, "transfer rejected"),
            EntryFailure::TransferUnconfirmed => write!(f, "transfer unconfirmed"),
        }
    }
}

/// Result of one sweep attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    #[serde(serialize_with = "serialize_key")]
    pub account: AccountId,
    #[serde(serialize_with = "serialize_key")]
    pub asset: AssetId,
    pub success: bool,
    pub amount_moved: u64,
    pub failure: Option<EntryFailure>,
}

impl EntryOutcome {
    pub fn moved(account: AccountId, asset: AssetId, amount: u64) -> Self {
        Self {
            account,
            asset,
            success: true,
            amount_moved: amount,
            failure: None,
        }
    }

    pub fn failed(account: AccountId, asset: AssetId, failure: EntryFailure) -> Self {
        Self {
            account,
            asset,
            success: false,
            amount_moved: 0,
            failure: Some(failure),
        }
    }
}

/// Aggregate result of one `execute_sweep` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Non-null entries attempted
    pub total_attempted: usize,
    /// Entries that moved funds
    pub total_succeeded: usize,
    /// Null-asset entries skipped without an attempt
    pub total_skipped: usize,
    /// Sum of all amounts moved, across assets
    pub total_moved: u128,
    /// One outcome per attempted entry, in request order
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchSummary {
    pub fn total_failed(&self) -> usize {
        self.total_attempted - self.total_succeeded
    }

    pub(crate) fn record(&mut self, outcome: EntryOutcome) {
        self.total_attempted += 1;
        if outcome.success {
            self.total_succeeded += 1;
            self.total_moved += u128::from(outcome.amount_moved);
        }
        self.outcomes.push(outcome);
    }
}

/// Dry-run result for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedEntry {
    #[serde(serialize_with = "serialize_key")]
    pub account: AccountId,
    #[serde(serialize_with = "serialize_key")]
    pub asset: AssetId,
    pub balance: Option<u64>,
    pub authorized: Option<u64>,
    /// Amount a real sweep would attempt to move (zero when it would fail early)
    pub planned_amount: u64,
    pub failure: Option<EntryFailure>,
}

/// Dry-run result for a whole request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepPlan {
    pub total_planned: usize,
    pub total_skipped: usize,
    pub entries: Vec<PlannedEntry>,
}

impl SweepPlan {
    /// Entries that would reach the transfer step
    pub fn transferable(&self) -> impl Iterator<Item = &PlannedEntry> {
        self.entries.iter().filter(|e| e.failure.is_none())
    }
}

/// Observable sweep events, emitted in request-processing order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SweepEvent {
    TransferCompleted {
        #[serde(serialize_with = "serialize_key")]
        account: AccountId,
        #[serde(serialize_with = "serialize_key")]
        asset: AssetId,
        #[serde(serialize_with = "serialize_key")]
        destination: AccountId,
        amount: u64,
    },
    BatchCompleted {
        total_attempted: usize,
        total_succeeded: usize,
    },
}

/// Keys serialize as base58 strings in reports
fn serialize_key<S: serde::Serializer>(
    key: &solana_sdk::pubkey::Pubkey,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    #[test]
    fn test_summary_record_counts() {
        let mut summary = BatchSummary::default();
        let (a, x) = (Pubkey::new_unique(), Pubkey::new_unique());

        summary.record(EntryOutcome::moved(a, x, 40));
        summary.record(EntryOutcome::failed(a, x, EntryFailure::ZeroBalance));
        summary.record(EntryOutcome::moved(a, x, u64::MAX));

        assert_eq!(summary.total_attempted, 3);
        assert_eq!(summary.total_succeeded, 2);
        assert_eq!(summary.total_failed(), 1);
        assert_eq!(summary.total_moved, 40 + u128::from(u64::MAX));
    }

    #[test]
    fn test_event_serializes_base58() {
        let account = Pubkey::new_unique();
        let event = SweepEvent::TransferCompleted {
            account,
            asset: Pubkey::default(),
            destination: Pubkey::new_unique(),
            amount: 5,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "transfer_completed");
        assert_eq!(json["account"], account.to_string());
        assert_eq!(json["asset"], "11111111111111111111111111111111");
    }
}
