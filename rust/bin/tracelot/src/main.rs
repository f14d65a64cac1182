//! `tracelot`: record product lots and activities, trace lineage.
//!
//! Usage:
//!   tracelot [--config FILE] [--data-dir DIR] [--db FILE] <command>
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.
//! Failures print `error[CODE]: message` and exit non-zero.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use trace::TraceService;
use tracelot_core::{ServiceConfig, ServiceError};
use tracing::{debug, info};

use commands::{activity::ActivityAction, lot::LotAction};

/// Product lot traceability.
#[derive(Parser, Debug)]
#[command(name = "tracelot", version, about = "Product lot traceability")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file).
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Database file (overrides the config file and data directory).
    #[arg(long = "db", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Product lot operations.
    Lot {
        #[command(subcommand)]
        action: LotAction,
    },

    /// Activity operations.
    Activity {
        #[command(subcommand)]
        action: ActivityAction,
    },

    /// Print the full lineage tree of a lot.
    Trace {
        /// Reference number of the lot (its id with --id).
        reference: String,
        /// Treat the argument as a lot id.
        #[arg(long)]
        id: bool,
    },

    /// Check every lot's quantities against the activity ledger.
    Audit,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ServiceError>() {
            Some(err) => {
                eprintln!("error[{}]: {}", err.error_code(), err);
                ExitCode::from(err.exit_code() as u8)
            }
            None => {
                eprintln!("error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Logs on stderr; stdout carries results only.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &cli.config {
        debug!("configuration from {}", path.display());
    }

    let db_path = config.resolve_db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    debug!("opening {}", db_path.display());
    let kv: Arc<dyn tracelot_kv::KVStore> = Arc::new(
        tracelot_kv::RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    let svc = TraceService::new(kv);
    info!("trace store {}", db_path.display());

    match cli.command {
        Commands::Lot { action } => commands::lot::run(&svc, action),
        Commands::Activity { action } => commands::activity::run(&svc, action),
        Commands::Trace { reference, id } => commands::trace::trace(&svc, &reference, id),
        Commands::Audit => commands::trace::audit(&svc),
    }
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    Ok(config)
}
