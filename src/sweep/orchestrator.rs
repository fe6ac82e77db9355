//! Sweep orchestrator
//!
//! Pulls the largest movable amount of every listed asset from every source
//! account into one destination. Ledger failures are absorbed per entry; only
//! an invalid request or a reentrant call aborts the batch.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ledger::{is_null, AccountId, AssetId, AssetLedger, LedgerError};

use super::events::{EventSink, TracingEventSink};
use super::guard::SweepGuard;
use super::request::SweepRequest;
use super::types::{BatchSummary, EntryFailure, EntryOutcome, PlannedEntry, SweepEvent, SweepPlan};
use super::validator::{validate_request, RequestLimits};

/// Balance and authorization read for one entry
#[derive(Debug, Clone, Copy)]
struct Quote {
    balance: Option<u64>,
    authorized: Option<u64>,
}

/// Batch asset-sweep engine
pub struct SweepOrchestrator<L: AssetLedger> {
    ledger: L,
    /// Identity the source accounts authorized
    spender: AccountId,
    sink: Arc<dyn EventSink>,
    limits: RequestLimits,
    in_progress: AtomicBool,
}

impl<L: AssetLedger> SweepOrchestrator<L> {
    /// Create an orchestrator that logs events through tracing
    pub fn new(ledger: L, spender: AccountId) -> Self {
        Self {
            ledger,
            spender,
            sink: Arc::new(TracingEventSink),
            limits: RequestLimits::default(),
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sweep every (account, asset) entry of `request` into its destination
    ///
    /// Fails only with `InvalidRequest` or `Reentrant`; in both cases nothing
    /// is called on the ledger and no event is emitted.
    pub fn execute_sweep(&self, request: &SweepRequest) -> Result<BatchSummary> {
        let _guard = SweepGuard::try_acquire(&self.in_progress)?;
        validate_request(request, &self.limits)?;

        info!(
            "Starting sweep of {} accounts into {}",
            request.accounts.len(),
            request.destination
        );

        let mut summary = BatchSummary::default();

        for (account, asset) in request.entries() {
            if is_null(asset) {
                debug!("Skipping null asset entry for {}", account);
                summary.total_skipped += 1;
                continue;
            }

            let outcome = self.sweep_asset(account, asset, &request.destination);
            if outcome.success {
                self.sink.emit(&SweepEvent::TransferCompleted {
                    account: *account,
                    asset: *asset,
                    destination: request.destination,
                    amount: outcome.amount_moved,
                });
            }
            summary.record(outcome);
        }

        self.sink.emit(&SweepEvent::BatchCompleted {
            total_attempted: summary.total_attempted,
            total_succeeded: summary.total_succeeded,
        });

        Ok(summary)
    }

    /// Dry run: read balances and authorizations without moving anything
    ///
    /// Validates and guards like [`Self::execute_sweep`] but never calls
    /// `transfer` and emits no events.
    pub fn plan_sweep(&self, request: &SweepRequest) -> Result<SweepPlan> {
        let _guard = SweepGuard::try_acquire(&self.in_progress)?;
        validate_request(request, &self.limits)?;

        let mut plan = SweepPlan::default();

        for (account, asset) in request.entries() {
            if is_null(asset) {
                plan.total_skipped += 1;
                continue;
            }

            plan.total_planned += 1;
            let (quote, result) = self.quote(account, asset);
            plan.entries.push(PlannedEntry {
                account: *account,
                asset: *asset,
                balance: quote.balance,
                authorized: quote.authorized,
                planned_amount: result.unwrap_or(0),
                failure: result.err(),
            });
        }

        Ok(plan)
    }

    /// Attempt one entry. Never fails: every ledger error becomes a failed outcome.
    fn sweep_asset(
        &self,
        account: &AccountId,
        asset: &AssetId,
        destination: &AccountId,
    ) -> EntryOutcome {
        let amount = match self.quote(account, asset).1 {
            Ok(amount) => amount,
            Err(failure) => {
                warn!("Skipping {} for {}: {}", asset, account, failure);
                return EntryOutcome::failed(*account, *asset, failure);
            }
        };

        match self.ledger.transfer(account, destination, amount, asset) {
            Ok(true) => {
                debug!("Moved {} of {} from {}", amount, asset, account);
                EntryOutcome::moved(*account, *asset, amount)
            }
            Ok(false) => {
                warn!("Transfer of {} from {} rejected by ledger", asset, account);
                EntryOutcome::failed(*account, *asset, EntryFailure::TransferRejected)
            }
            Err(LedgerError::Unavailable(e)) => {
                warn!(
                    "Transfer of {} from {} unconfirmed, check before retrying: {}",
                    asset, account, e
                );
                EntryOutcome::failed(*account, *asset, EntryFailure::TransferUnconfirmed)
            }
            Err(e) => {
                warn!("Transfer of {} from {} failed: {}", asset, account, e);
                EntryOutcome::failed(*account, *asset, EntryFailure::TransferFailed)
            }
        }
    }

    /// Steps 1-3: balance, authorization, min of the two
    fn quote(
        &self,
        account: &AccountId,
        asset: &AssetId,
    ) -> (Quote, std::result::Result<u64, EntryFailure>) {
        let mut quote = Quote {
            balance: None,
            authorized: None,
        };

        let balance = match self.ledger.balance_of(account, asset) {
            Ok(balance) => balance,
            Err(e) => {
                debug!("Balance query for {} / {} failed: {}", account, asset, e);
                return (quote, Err(EntryFailure::BalanceQueryFailed));
            }
        };
        quote.balance = Some(balance);
        if balance == 0 {
            return (quote, Err(EntryFailure::ZeroBalance));
        }

        let authorized = match self.ledger.authorized_amount(account, &self.spender, asset) {
            Ok(authorized) => authorized,
            Err(e) => {
                debug!("Authorization query for {} / {} failed: {}", account, asset, e);
                return (quote, Err(EntryFailure::AuthorizationQueryFailed));
            }
        };
        quote.authorized = Some(authorized);
        if authorized == 0 {
            return (quote, Err(EntryFailure::ZeroAuthorization));
        }

        (quote, Ok(balance.min(authorized)))
    }
}
