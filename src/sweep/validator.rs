//! Request validation
//!
//! Runs in full before any ledger call. A rejected request has no side effects.

use crate::error::{Error, Result};
use crate::ledger::is_null;

use super::request::SweepRequest;

/// Optional batch size limits (unset = unlimited)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_accounts: Option<usize>,
    pub max_assets_per_account: Option<usize>,
}

/// Validate a sweep request
///
/// Checks:
/// - At least one source account
/// - Destination is not the null key
/// - Every source account lists at least one asset
/// - Configured size limits, if any
pub fn validate_request(request: &SweepRequest, limits: &RequestLimits) -> Result<()> {
    if request.accounts.is_empty() {
        return Err(Error::InvalidRequest(
            "at least one source account is required".to_string(),
        ));
    }

    if is_null(&request.destination) {
        return Err(Error::InvalidRequest(
            "destination must not be the null account".to_string(),
        ));
    }

    if let Some(max) = limits.max_accounts {
        if request.accounts.len() > max {
            return Err(Error::InvalidRequest(format!(
                "{} source accounts exceeds limit of {}",
                request.accounts.len(),
                max
            )));
        }
    }

    for (i, account) in request.accounts.iter().enumerate() {
        if account.assets.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "source account {} ({}) has no assets",
                i, account.owner
            )));
        }

        if let Some(max) = limits.max_assets_per_account {
            if account.assets.len() > max {
                return Err(Error::InvalidRequest(format!(
                    "source account {} ({}) lists {} assets, limit is {}",
                    i,
                    account.owner,
                    account.assets.len(),
                    max
                )));
            }
        }
    }

    Ok(())
}
