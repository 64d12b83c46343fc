//! Periodic maintenance loop.
//!
//! Runs the time-driven batch transitions on an interval: approved
//! records past the grace window move to awaiting-report, awaiting
//! records past their deadline expire, and deadline reminders go out.
//! Each pass scans the whole table once; a failed pass is logged and the
//! loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use credline_core::config::SweeperConfig;

use crate::service::SubmissionService;

pub struct Sweeper {
    service: SubmissionService,
    config: SweeperConfig,
    is_running: Arc<tokio::sync::RwLock<bool>>,
}

impl Sweeper {
    pub fn new(service: SubmissionService, config: SweeperConfig) -> Self {
        Self {
            service,
            config,
            is_running: Arc::new(tokio::sync::RwLock::new(false)),
        }
    }

    /// Run sweep passes until `stop` is called.
    pub async fn run(&self) {
        *self.is_running.write().await = true;
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            interval.tick().await;
            if !*self.is_running.read().await {
                break;
            }

            match self.service.sweep(Utc::now()).await {
                Ok(summary) => {
                    if summary.advanced + summary.expired + summary.reminders_sent > 0 {
                        tracing::info!(
                            advanced = summary.advanced,
                            expired = summary.expired,
                            reminders = summary.reminders_sent,
                            "sweep pass complete"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "sweep pass failed");
                }
            }
        }
    }

    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }
}
