//! In-memory ledger for tests
//!
//! Balances and authorizations default to zero. Successful transfers debit
//! both the balance and the authorization, so a second sweep sees nothing left.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{AccountId, AssetId, AssetLedger, LedgerError};

/// How `transfer` behaves for a given asset
#[derive(Debug, Clone, PartialEq)]
pub enum TransferBehavior {
    Succeed,
    ReturnFalse,
    Fail(LedgerError),
}

type Hook = Box<dyn Fn() + Send>;

/// Ledger step a one-shot hook runs inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BalanceOf,
    AuthorizedAmount,
    Transfer,
}

/// Recorded ledger call, in invocation order
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCall {
    BalanceOf(AccountId, AssetId),
    AuthorizedAmount(AccountId, AccountId, AssetId),
    Transfer(AccountId, AccountId, u64, AssetId),
}

#[derive(Default)]
pub struct MockLedger {
    balances: Mutex<HashMap<(AccountId, AssetId), u64>>,
    allowances: Mutex<HashMap<(AccountId, AssetId), u64>>,
    balance_failures: Mutex<HashMap<AssetId, LedgerError>>,
    allowance_failures: Mutex<HashMap<AssetId, LedgerError>>,
    transfer_behavior: Mutex<HashMap<AssetId, TransferBehavior>>,
    calls: Mutex<Vec<LedgerCall>>,
    hooks: Mutex<HashMap<HookPoint, Hook>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, account: AccountId, asset: AssetId, amount: u64) {
        self.balances.lock().unwrap().insert((account, asset), amount);
    }

    /// Authorization granted by `owner` to whichever spender asks
    pub fn set_allowance(&self, owner: AccountId, asset: AssetId, amount: u64) {
        self.allowances.lock().unwrap().insert((owner, asset), amount);
    }

    pub fn fail_balance(&self, asset: AssetId, error: LedgerError) {
        self.balance_failures.lock().unwrap().insert(asset, error);
    }

    pub fn fail_allowance(&self, asset: AssetId, error: LedgerError) {
        self.allowance_failures.lock().unwrap().insert(asset, error);
    }

    pub fn set_transfer_behavior(&self, asset: AssetId, behavior: TransferBehavior) {
        self.transfer_behavior.lock().unwrap().insert(asset, behavior);
    }

    /// Run `hook` once, from inside the next call at `point`
    pub fn on_next(&self, point: HookPoint, hook: impl Fn() + Send + 'static) {
        self.hooks.lock().unwrap().insert(point, Box::new(hook));
    }

    // Take the hook first so the lock is not held while it re-enters
    fn run_hook(&self, point: HookPoint) {
        let hook = self.hooks.lock().unwrap().remove(&point);
        if let Some(hook) = hook {
            hook();
        }
    }

    pub fn balance(&self, account: &AccountId, asset: &AssetId) -> u64 {
        self.balances
            .lock()
            .unwrap()
            .get(&(*account, *asset))
            .copied()
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn transfer_calls(&self) -> Vec<LedgerCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, LedgerCall::Transfer(..)))
            .collect()
    }

    fn record(&self, call: LedgerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AssetLedger for MockLedger {
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> Result<u64, LedgerError> {
        self.record(LedgerCall::BalanceOf(*account, *asset));
        self.run_hook(HookPoint::BalanceOf);

        if let Some(err) = self.balance_failures.lock().unwrap().get(asset) {
            return Err(err.clone());
        }
        Ok(self.balance(account, asset))
    }

    fn authorized_amount(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        asset: &AssetId,
    ) -> Result<u64, LedgerError> {
        self.record(LedgerCall::AuthorizedAmount(*owner, *spender, *asset));
        self.run_hook(HookPoint::AuthorizedAmount);

        if let Some(err) = self.allowance_failures.lock().unwrap().get(asset) {
            return Err(err.clone());
        }
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(*owner, *asset))
            .copied()
            .unwrap_or(0))
    }

    fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
        asset: &AssetId,
    ) -> Result<bool, LedgerError> {
        self.record(LedgerCall::Transfer(*from, *to, amount, *asset));
        self.run_hook(HookPoint::Transfer);

        let behavior = self
            .transfer_behavior
            .lock()
            .unwrap()
            .get(asset)
            .cloned()
            .unwrap_or(TransferBehavior::Succeed);

        match behavior {
            TransferBehavior::Fail(err) => Err(err),
            TransferBehavior::ReturnFalse => Ok(false),
            TransferBehavior::Succeed => {
                let mut balances = self.balances.lock().unwrap();
                let mut allowances = self.allowances.lock().unwrap();

                let from_balance = balances.entry((*from, *asset)).or_insert(0);
                let allowance = allowances.entry((*from, *asset)).or_insert(0);
                if *from_balance < amount || *allowance < amount {
                    return Err(LedgerError::Rejected("insufficient funds".to_string()));
                }
                *from_balance -= amount;
                *allowance -= amount;
                *balances.entry((*to, *asset)).or_insert(0) += amount;
                Ok(true)
            }
        }
    }
}
