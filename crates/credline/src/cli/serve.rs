use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use credline_core::CredlineConfig;
use credline_server::{Gateway, Sweeper};

/// Run the HTTP gateway, with the in-process sweeper when enabled.
#[derive(Parser)]
pub struct ServeCommand {
    /// Override the configured gateway port.
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(self, mut config: CredlineConfig) -> Result<()> {
        if let Some(port) = self.port {
            config.gateway.port = port;
        }

        let service = super::build_service(&config).await?;

        let mut sweeper = None;
        if config.sweeper.enabled {
            let handle = Arc::new(Sweeper::new(service.clone(), config.sweeper.clone()));
            let runner = handle.clone();
            tokio::spawn(async move { runner.run().await });
            tracing::info!(
                interval_secs = config.sweeper.interval_secs,
                "sweeper started"
            );
            sweeper = Some(handle);
        }

        let gateway = Gateway::new(config.gateway.clone(), service);
        tracing::info!(project = %config.project.name, "starting gateway");

        tokio::select! {
            result = gateway.run() => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                if let Some(sweeper) = sweeper {
                    sweeper.stop().await;
                }
                Ok(())
            }
        }
    }
}
