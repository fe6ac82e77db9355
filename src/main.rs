//! Token Sweeper - pull delegated SPL token balances into one wallet
//!
//! # WARNING
//! - Sweeps move real funds. Run `sweep plan` first.
//! - The delegate keypair must be the delegate every source account approved.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

// Use the library crate
use token_sweeper::cli::commands;
use token_sweeper::config::Config;

/// Token Sweeper - batch SPL token sweeps
#[derive(Parser)]
#[command(name = "sweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "sweeper.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long, env = "SWEEPER_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a sweep
    Run {
        /// Request file (JSON)
        request: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,

        /// Simulate only, don't execute
        #[arg(long)]
        dry_run: bool,

        /// Where to write the sweep report (default: report.dir)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show what a sweep would move
    Plan {
        /// Request file (JSON)
        request: PathBuf,
    },

    /// Check a request file offline
    Validate {
        /// Request file (JSON)
        request: PathBuf,
    },

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.json_logs)?;

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Loaded configuration from {}", cli.config);

    // Execute command
    let result = match cli.command {
        Commands::Run {
            request,
            force,
            dry_run,
            report,
        } => commands::run(&config, &request, force, dry_run, report).await,
        Commands::Plan { request } => commands::plan(&config, &request).await,
        Commands::Validate { request } => commands::validate(&config, &request),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        let code = commands::exit_code(&e);
        if code == 2 {
            error!("Sweep refused, nothing was moved: {:#}", e);
        } else {
            error!("Command failed: {:#}", e);
        }
        std::process::exit(code);
    }

    Ok(())
}

/// Initialize tracing
fn init_tracing(json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("token_sweeper=info".parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
