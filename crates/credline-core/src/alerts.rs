//! Inbox alerts derived from the current record set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Status, Submission};

/// Alert category shown in the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    NewSubmission,
    DeadlineSoon,
    ReportReceived,
    Expired,
}

/// One inbox alert. Ids are deterministic so repeated computations of
/// the same state produce the same alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub submission_id: Uuid,
    pub submission_title: String,
    pub creator_name: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

/// Deadline warnings for awaiting-report records within seven days of
/// their deadline, plus one alert per record still awaiting approval.
/// Newest first.
pub fn deadline_alerts(subs: &[Submission], now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for sub in subs.iter().filter(|s| s.status == Status::AwaitingReport) {
        let Some(days_remaining) = sub.days_until_deadline(now) else {
            continue;
        };
        if days_remaining > 0 && days_remaining <= 7 {
            alerts.push(Alert {
                id: format!("alert-{}-{}d", sub.id, days_remaining),
                kind: AlertKind::DeadlineSoon,
                submission_id: sub.id,
                submission_title: sub.title.clone(),
                creator_name: sub.creator_name.clone(),
                message: format!("{days_remaining} day(s) left until the report deadline"),
                date: now,
            });
        }
    }

    for sub in subs.iter().filter(|s| s.status == Status::Pending) {
        alerts.push(Alert {
            id: format!("alert-pending-{}", sub.id),
            kind: AlertKind::NewSubmission,
            submission_id: sub.id,
            submission_title: sub.title.clone(),
            creator_name: sub.creator_name.clone(),
            message: "New submission awaiting approval".to_string(),
            date: sub.created_at,
        });
    }

    alerts.sort_by(|a, b| b.date.cmp(&a.date));
    alerts
}
