mod report;
mod serve;
mod sweep;

pub use report::ReportCommand;
pub use serve::ServeCommand;
pub use sweep::SweepCommand;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use credline_core::config::StoreBackend;
use credline_core::{CredlineConfig, WorkflowEngine};
use credline_server::{
    MemoryStore, PgStore, RecordStore, SubmissionService, WebhookNotifier,
};

/// Credline - submission approval, report and payout tracking.
#[derive(Parser)]
#[command(name = "credline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "credline.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP gateway and the periodic sweeper.
    Serve(ServeCommand),

    /// Run one maintenance pass (advance, expire, remind) and exit.
    Sweep(SweepCommand),

    /// Print the payout report for a period.
    Report(ReportCommand),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let config = load_config(&self.config)?;
        match self.command {
            Commands::Serve(cmd) => cmd.execute(config).await,
            Commands::Sweep(cmd) => cmd.execute(config).await,
            Commands::Report(cmd) => cmd.execute(config).await,
        }
    }
}

fn load_config(path: &str) -> Result<CredlineConfig> {
    if std::path::Path::new(path).exists() {
        CredlineConfig::from_file(path).with_context(|| format!("loading config from {path}"))
    } else {
        tracing::info!(path, "config file not found, using defaults");
        Ok(CredlineConfig::default())
    }
}

/// Wire the service from configuration: store backend, engine, notifier.
pub(crate) async fn build_service(config: &CredlineConfig) -> Result<SubmissionService> {
    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("memory store selected, records will not survive a restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            let url = config
                .store
                .database_url
                .as_deref()
                .context("store.database_url is required for the postgres backend")?;
            Arc::new(PgStore::connect(url).await?)
        }
    };

    let engine = WorkflowEngine::new(config.workflow.clone());
    let notifier = Arc::new(WebhookNotifier::new(config.notifier.webhook_url.clone()));

    Ok(SubmissionService::new(store, engine, notifier))
}
