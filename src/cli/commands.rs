//! CLI command implementations

use anyhow::{Context, Result};
use chrono::Utc;
use dialoguer::Confirm;
use solana_client::rpc_client::RpcClient;
use solana_sdk::signature::{Keypair, Signer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::ledger::SplTokenLedger;
use crate::report::SweepReport;
use crate::sweep::{
    validate_request, BatchSummary, FanoutEventSink, MemoryEventSink, SweepOrchestrator,
    SweepPlan, SweepRequest, TracingEventSink,
};

/// Execute a sweep from a request file
pub async fn run(
    config: &Config,
    request_path: &Path,
    force: bool,
    dry_run: bool,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let request = load_request(config, request_path)?;

    if dry_run {
        warn!("Running in DRY-RUN mode - no tokens will be moved");
        return plan_request(config, request).await;
    }

    let ledger = build_ledger(config)?;
    info!(
        "Sweeping {} entries from {} accounts into {} (delegate {})",
        request.entries().count(),
        request.accounts.len(),
        request.destination,
        ledger.delegate_pubkey()
    );

    if config.sweep.require_confirmation && !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Sweep {} accounts into {}? This cannot be undone.",
                request.accounts.len(),
                request.destination
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Sweep cancelled by user");
            return Ok(());
        }
    }

    let started_at = Utc::now();
    let limits = config.sweep.limits();
    let memory = Arc::new(MemoryEventSink::new());
    let sink = FanoutEventSink::new()
        .with(Arc::new(TracingEventSink))
        .with(memory.clone());

    // The RPC client blocks, so keep it off the async workers
    let sweep_request = request.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let delegate = ledger.delegate_pubkey();
        SweepOrchestrator::new(ledger, delegate)
            .with_event_sink(Arc::new(sink))
            .with_limits(limits)
            .execute_sweep(&sweep_request)
    })
    .await
    .context("Sweep task panicked")?
    .map_err(|e| {
        error!("Sweep aborted: {}", e);
        anyhow::Error::from(e)
    })?;

    print_summary(&summary);

    let report = SweepReport::new(&request, started_at, summary, memory.drain());
    let path = report_path.unwrap_or_else(|| report.default_path(&config.report.dir));
    report
        .save(&path)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    println!("Report: {}", path.display());

    Ok(())
}

/// Show what a sweep would move without sending anything
pub async fn plan(config: &Config, request_path: &Path) -> Result<()> {
    let request = load_request(config, request_path)?;
    plan_request(config, request).await
}

async fn plan_request(config: &Config, request: SweepRequest) -> Result<()> {
    let ledger = build_ledger(config)?;
    let limits = config.sweep.limits();

    let plan = tokio::task::spawn_blocking(move || {
        let delegate = ledger.delegate_pubkey();
        SweepOrchestrator::new(ledger, delegate)
            .with_limits(limits)
            .plan_sweep(&request)
    })
    .await
    .context("Plan task panicked")??;

    print_plan(&plan);
    Ok(())
}

/// Parse and validate a request file without touching the network
pub fn validate(config: &Config, request_path: &Path) -> Result<()> {
    let request = load_request(config, request_path)?;
    let skipped = request
        .entries()
        .filter(|(_, asset)| crate::ledger::is_null(asset))
        .count();

    println!("\n=== REQUEST OK ===");
    println!("Destination: {}", request.destination);
    println!("Accounts:    {}", request.accounts.len());
    println!("Entries:     {} ({} null, skipped)", request.entries().count(), skipped);
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    match std::env::var("KEYPAIR_PATH") {
        Ok(path) => println!("Delegate keypair: {}", path),
        Err(_) => println!("Delegate keypair: (KEYPAIR_PATH not set)"),
    }
    Ok(())
}

/// Process exit code for a failed command: 2 when the sweep request itself
/// was refused, 1 for everything else
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let batch_fatal = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<crate::Error>())
        .any(crate::Error::is_batch_fatal);
    if batch_fatal {
        2
    } else {
        1
    }
}

fn load_request(config: &Config, path: &Path) -> Result<SweepRequest> {
    let request = SweepRequest::load(path)
        .with_context(|| format!("Failed to load request {}", path.display()))?;
    validate_request(&request, &config.sweep.limits())?;
    Ok(request)
}

fn build_ledger(config: &Config) -> Result<SplTokenLedger> {
    let delegate = load_keypair()?;
    info!("Loaded delegate keypair: {}", delegate.pubkey());

    let rpc_client = RpcClient::new_with_timeout_and_commitment(
        config.rpc.endpoint.clone(),
        std::time::Duration::from_millis(config.rpc.timeout_ms),
        config.commitment()?,
    );

    Ok(SplTokenLedger::new(
        rpc_client,
        delegate,
        config.sweep.ledger_config(),
    ))
}

/// Load the delegate keypair from KEYPAIR_PATH (JSON byte array)
fn load_keypair() -> Result<Keypair> {
    let keypair_path = std::env::var("KEYPAIR_PATH")
        .map_err(|_| crate::Error::MissingEnvVar("KEYPAIR_PATH".to_string()))?;
    let keypair_data = std::fs::read_to_string(&keypair_path)
        .with_context(|| format!("Failed to read keypair file: {}", keypair_path))?;
    let secret_key: Vec<u8> = serde_json::from_str(&keypair_data)
        .with_context(|| format!("Failed to parse keypair JSON: {}", keypair_path))?;
    Keypair::from_bytes(&secret_key)
        .map_err(|e| crate::Error::InvalidKeypair(format!("{}: {}", keypair_path, e)).into())
}

fn print_summary(summary: &BatchSummary) {
    println!("\n=== SWEEP COMPLETE ===");
    println!(
        "Attempted: {}  Succeeded: {}  Failed: {}  Skipped: {}",
        summary.total_attempted,
        summary.total_succeeded,
        summary.total_failed(),
        summary.total_skipped
    );
    for outcome in &summary.outcomes {
        match outcome.failure {
            None => println!(
                "  OK    {} {} moved {}",
                short(&outcome.account.to_string()),
                short(&outcome.asset.to_string()),
                outcome.amount_moved
            ),
            Some(failure) => println!(
                "  FAIL  {} {} {}",
                short(&outcome.account.to_string()),
                short(&outcome.asset.to_string()),
                failure
            ),
        }
    }
}

fn print_plan(plan: &SweepPlan) {
    println!("\n=== DRY RUN ===");
    println!(
        "Entries: {}  Transferable: {}  Skipped (null): {}",
        plan.total_planned,
        plan.transferable().count(),
        plan.total_skipped
    );
    for entry in &plan.entries {
        let balance = entry.balance.map_or("-".to_string(), |b| b.to_string());
        let authorized = entry.authorized.map_or("-".to_string(), |a| a.to_string());
        match entry.failure {
            None => println!(
                "  WOULD MOVE {:>20} of {} from {} (balance {}, authorized {})",
                entry.planned_amount,
                short(&entry.asset.to_string()),
                short(&entry.account.to_string()),
                balance,
                authorized
            ),
            Some(failure) => println!(
                "  SKIP  {} {} {} (balance {}, authorized {})",
                short(&entry.account.to_string()),
                short(&entry.asset.to_string()),
                failure,
                balance,
                authorized
            ),
        }
    }
}

/// Truncate address for display (first 8...last 4)
fn short(addr: &str) -> String {
    if addr.len() > 16 {
        format!("{}...{}", &addr[..8], &addr[addr.len() - 4..])
    } else {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_short_address() {
        assert_eq!(
            short("So11111111111111111111111111111111111111112"),
            "So111111...1112"
        );
        assert_eq!(short("abc"), "abc");
    }

    #[test]
    fn test_validate_command() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"destination": "{}", "accounts": [{{"owner": "{}", "assets": ["11111111111111111111111111111111"]}}]}}"#,
            solana_sdk::pubkey::Pubkey::new_unique(),
            solana_sdk::pubkey::Pubkey::new_unique()
        )
        .unwrap();

        assert!(validate(&Config::default(), file.path()).is_ok());
    }

    #[test]
    fn test_validate_command_rejects_empty_request() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"destination": "{}", "accounts": []}}"#,
            solana_sdk::pubkey::Pubkey::new_unique()
        )
        .unwrap();

        assert!(validate(&Config::default(), file.path()).is_err());
    }

    #[test]
    fn test_exit_code_for_refused_request() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"destination": "11111111111111111111111111111111", "accounts": [{{"owner": "{}", "assets": []}}]}}"#,
            solana_sdk::pubkey::Pubkey::new_unique()
        )
        .unwrap();

        let err = validate(&Config::default(), file.path()).unwrap_err();
        assert_eq!(exit_code(&err), 2);

        let wrapped = anyhow::Error::from(crate::Error::Reentrant).context("Sweep aborted");
        assert_eq!(exit_code(&wrapped), 2);
    }

    #[test]
    fn test_exit_code_for_other_failures() {
        let missing = anyhow::Error::from(crate::Error::MissingEnvVar("KEYPAIR_PATH".into()));
        assert_eq!(exit_code(&missing), 1);

        let err = validate(&Config::default(), Path::new("/nonexistent/request.json")).unwrap_err();
        assert_eq!(exit_code(&err), 1);
    }
}
