//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use std::path::Path;

use crate::ledger::SplLedgerConfig;
use crate::sweep::RequestLimits;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// processed, confirmed or finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Reject requests with more source accounts than this
    #[serde(default)]
    pub max_accounts: Option<usize>,

    /// Reject requests where any account lists more assets than this
    #[serde(default)]
    pub max_assets_per_account: Option<usize>,

    /// Create the destination's token account before transferring
    #[serde(default = "default_true")]
    pub create_destination_accounts: bool,

    /// Ask before executing a sweep (overridden by --force)
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_accounts: None,
            max_assets_per_account: None,
            create_destination_accounts: true,
            require_confirmation: true,
        }
    }
}

impl SweepConfig {
    pub fn limits(&self) -> RequestLimits {
        RequestLimits {
            max_accounts: self.max_accounts,
            max_assets_per_account: self.max_assets_per_account,
        }
    }

    pub fn ledger_config(&self) -> SplLedgerConfig {
        SplLedgerConfig {
            create_destination_accounts: self.create_destination_accounts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Directory sweep reports are written to when no explicit path is given
    #[serde(default = "default_report_dir")]
    pub dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
        }
    }
}

// Default value functions
fn default_rpc_endpoint() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_commitment() -> String {
    "confirmed".to_string()
}
fn default_report_dir() -> String {
    "reports".to_string()
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file and environment
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            .set_default("rpc.commitment", default_commitment())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SWEEPER_)
            .add_source(
                config::Environment::with_prefix("SWEEPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://")
        {
            anyhow::bail!("rpc.endpoint must be an http(s) URL: {}", self.rpc.endpoint);
        }

        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be positive");
        }

        self.commitment()?;

        if self.sweep.max_accounts == Some(0) {
            anyhow::bail!("sweep.max_accounts must be positive when set");
        }
        if self.sweep.max_assets_per_account == Some(0) {
            anyhow::bail!("sweep.max_assets_per_account must be positive when set");
        }

        if !self.sweep.create_destination_accounts {
            tracing::warn!(
                "create_destination_accounts is off - transfers fail when the destination has no token account"
            );
        }

        Ok(())
    }

    /// Parsed RPC commitment level
    pub fn commitment(&self) -> Result<CommitmentConfig> {
        match self.rpc.commitment.to_lowercase().as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => anyhow::bail!("Unknown rpc.commitment: {}", other),
        }
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    timeout: {}ms
    commitment: {}
  Sweep:
    max_accounts: {}
    max_assets_per_account: {}
    create_destination_accounts: {}
    require_confirmation: {}
  Report:
    dir: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.rpc.commitment,
            display_limit(self.sweep.max_accounts),
            display_limit(self.sweep.max_assets_per_account),
            self.sweep.create_destination_accounts,
            self.sweep.require_confirmation,
            self.report.dir,
        )
    }
}

fn display_limit(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |l| l.to_string())
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                endpoint: default_rpc_endpoint(),
                timeout_ms: default_timeout_ms(),
                commitment: default_commitment(),
            },
            sweep: SweepConfig::default(),
            report: ReportConfig::default(),
        }
    }
}
