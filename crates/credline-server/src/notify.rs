//! Fire-and-forget chat notifications.
//!
//! Delivery runs after the state write has committed and is never awaited
//! for the operation's own success. A failed delivery is logged and
//! swallowed; nothing is rolled back or retried.

use async_trait::async_trait;
use serde_json::json;

/// Workflow events that produce a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NewSubmission,
    Approved,
    Rejected,
    ReportReceived,
    DeadlineReminder,
}

/// Everything a notification message needs about the triggering record.
#[derive(Debug, Clone)]
pub struct NotifyEvent {
    pub kind: EventKind,
    pub title: String,
    pub creator_name: String,
    pub creator_email: String,
    pub link: String,
    /// Credit awarded, for report-received events. 0 signals "late".
    pub credit: Option<f64>,
    /// Days remaining, for deadline reminders.
    pub days_remaining: Option<i64>,
    /// Rejection reason, when one was given.
    pub reason: Option<String>,
}

/// Outbound notification channel. Returns whether delivery succeeded;
/// callers only use the result for logging.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &NotifyEvent) -> bool;
}

/// Posts Slack-style incoming-webhook messages.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url,
        }
    }

    fn message(event: &NotifyEvent) -> serde_json::Value {
        let headline = match event.kind {
            EventKind::NewSubmission => format!("📥 New submission: {}", event.title),
            EventKind::Approved => format!("✅ Approved: {}", event.title),
            EventKind::Rejected => format!("❌ Rejected: {}", event.title),
            EventKind::ReportReceived => match event.credit {
                Some(credit) if credit > 0.0 => {
                    format!("📊 Report received for {} (credit R${credit:.2})", event.title)
                }
                _ => format!("📊 Report received for {} (past deadline, no credit)", event.title),
            },
            EventKind::DeadlineReminder => {
                let days = event.days_remaining.unwrap_or(0);
                let urgency = if days <= 1 {
                    "🚨"
                } else if days <= 3 {
                    "⚠️"
                } else {
                    "📢"
                };
                format!("{urgency} Report deadline: {days} day(s) left for {}", event.title)
            }
        };

        let mut body = format!(
            "*Submission:* {}\n*Creator:* {} ({})",
            event.title, event.creator_name, event.creator_email
        );
        if let Some(reason) = &event.reason {
            body.push_str(&format!("\n*Reason:* {reason}"));
        }
        if !event.link.is_empty() {
            body.push_str(&format!("\n*Link:* {}", event.link));
        }

        json!({
            "text": headline,
            "blocks": [
                {
                    "type": "header",
                    "text": { "type": "plain_text", "text": headline, "emoji": true }
                },
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": body }
                }
            ]
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &NotifyEvent) -> bool {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("notifier webhook_url not configured, skipping");
            return false;
        };

        match self
            .client
            .post(url)
            .json(&Self::message(event))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "webhook delivery rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "webhook delivery failed");
                false
            }
        }
    }
}

/// Records events instead of delivering them. Test support.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: tokio::sync::Mutex<Vec<NotifyEvent>>,
}

impl RecordingNotifier {
    /// Deliveries run on spawned tasks, so tests poll until at least
    /// `expected` events have landed (or a short budget runs out).
    pub async fn settled(&self, expected: usize) -> Vec<NotifyEvent> {
        for _ in 0..500 {
            {
                let events = self.events.lock().await;
                if events.len() >= expected {
                    return events.clone();
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &NotifyEvent) -> bool {
        self.events.lock().await.push(event.clone());
        true
    }
}
