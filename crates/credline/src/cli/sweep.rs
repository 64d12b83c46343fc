use anyhow::Result;
use chrono::Utc;
use clap::Parser;

use credline_core::CredlineConfig;

/// Run one maintenance pass and print the counts.
#[derive(Parser)]
pub struct SweepCommand {}

impl SweepCommand {
    pub async fn execute(self, config: CredlineConfig) -> Result<()> {
        let service = super::build_service(&config).await?;
        let summary = service.sweep(Utc::now()).await?;

        println!(
            "advanced: {}, expired: {}, reminders sent: {}",
            summary.advanced, summary.expired, summary.reminders_sent
        );
        Ok(())
    }
}
