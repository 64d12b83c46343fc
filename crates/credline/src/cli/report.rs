use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;

use credline_core::metrics::start_of_week;
use credline_core::CredlineConfig;
use credline_server::export::payout_csv;

/// Print the payout report for a period.
#[derive(Parser)]
pub struct ReportCommand {
    /// Named period: this_week (default) or last_week.
    #[arg(long, default_value = "this_week", conflicts_with_all = ["start", "end"])]
    pub period: String,

    /// Explicit period start (RFC 3339).
    #[arg(long, requires = "end")]
    pub start: Option<DateTime<Utc>>,

    /// Explicit period end (RFC 3339).
    #[arg(long, requires = "start")]
    pub end: Option<DateTime<Utc>>,

    /// Emit CSV instead of JSON.
    #[arg(long)]
    pub csv: bool,
}

impl ReportCommand {
    pub async fn execute(self, config: CredlineConfig) -> Result<()> {
        let (start, end) = match (self.start, self.end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let this_week = start_of_week(Utc::now());
                match self.period.as_str() {
                    "this_week" => (this_week, this_week + Duration::weeks(1)),
                    "last_week" => (this_week - Duration::weeks(1), this_week),
                    other => bail!("unknown period: {other}"),
                }
            }
        };

        let service = super::build_service(&config).await?;
        let report = service.payout_report(start, end).await?;

        if self.csv {
            print!("{}", payout_csv(&report));
        } else {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Ok(())
    }
}
