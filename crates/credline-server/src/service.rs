//! Request-scoped orchestration: fetch, validate through the workflow
//! engine, write back once, then notify.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use credline_core::{
    deadline_alerts, Alert, ChartMetrics, CredlineError, Metrics, NewSubmission, PayoutReport,
    ReportInput, Result, Status, Submission, SubmissionFilter, WorkflowEngine,
};

use crate::notify::{EventKind, Notifier, NotifyEvent};
use crate::store::RecordStore;

/// Outcome of a create call. `duplicate` marks payloads that matched an
/// existing pending record and were suppressed instead of inserted.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    #[serde(flatten)]
    pub submission: Submission,
    pub duplicate: bool,
}

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepSummary {
    pub advanced: usize,
    pub expired: usize,
    pub reminders_sent: usize,
}

#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn RecordStore>,
    engine: WorkflowEngine,
    notifier: Arc<dyn Notifier>,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        engine: WorkflowEngine,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            engine,
            notifier,
        }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Create one submission. A payload matching an existing pending
    /// record with the same title and creator name returns that record
    /// flagged as duplicate instead of inserting again.
    pub async fn create(&self, input: &NewSubmission) -> Result<CreateOutcome> {
        let complexity = input.validate()?;
        let email = input.resolved_email(&self.engine.config().mail_domain);

        let existing = self.store.list_all().await?;
        if let Some(dup) = existing.iter().find(|s| {
            s.status == Status::Pending
                && s.title == input.title
                && s.creator_name == input.creator_name
        }) {
            tracing::info!(id = %dup.id, title = %dup.title, "duplicate submission suppressed");
            return Ok(CreateOutcome {
                submission: dup.clone(),
                duplicate: true,
            });
        }

        let sub = Submission::new(input, complexity, email);
        self.store.insert(&sub).await?;
        tracing::info!(id = %sub.id, title = %sub.title, "submission created");

        self.emit(NotifyEvent {
            kind: EventKind::NewSubmission,
            title: sub.title.clone(),
            creator_name: sub.creator_name.clone(),
            creator_email: sub.creator_email.clone(),
            link: sub.link.clone(),
            credit: None,
            days_remaining: None,
            reason: None,
        });

        Ok(CreateOutcome {
            submission: sub,
            duplicate: false,
        })
    }

    /// Webhook intake: one payload or a batch.
    pub async fn create_batch(&self, inputs: &[NewSubmission]) -> Result<Vec<CreateOutcome>> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            outcomes.push(self.create(input).await?);
        }
        Ok(outcomes)
    }

    /// List records matching the filter, newest first.
    pub async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>> {
        let mut subs: Vec<Submission> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect();
        subs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subs)
    }

    pub async fn get(&self, id: Uuid) -> Result<Submission> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| CredlineError::NotFound(format!("submission {id}")))
    }

    /// Approve a pending submission.
    pub async fn approve(&self, id: Uuid) -> Result<Submission> {
        let current = self.get(id).await?;
        let approved = self.engine.approve(current, Utc::now())?;
        self.store.update(&approved).await?;
        tracing::info!(id = %id, "submission approved");

        self.emit(NotifyEvent {
            kind: EventKind::Approved,
            title: approved.title.clone(),
            creator_name: approved.creator_name.clone(),
            creator_email: approved.creator_email.clone(),
            link: approved.link.clone(),
            credit: Some(approved.creation_credit),
            days_remaining: None,
            reason: None,
        });

        Ok(approved)
    }

    /// Reject a pending submission, optionally recording the reason.
    pub async fn reject(&self, id: Uuid, reason: Option<String>) -> Result<Submission> {
        let current = self.get(id).await?;
        let rejected = self.engine.reject(current, reason)?;
        self.store.update(&rejected).await?;
        tracing::info!(id = %id, "submission rejected");

        self.emit(NotifyEvent {
            kind: EventKind::Rejected,
            title: rejected.title.clone(),
            creator_name: rejected.creator_name.clone(),
            creator_email: rejected.creator_email.clone(),
            link: rejected.link.clone(),
            credit: None,
            days_remaining: None,
            reason: rejected.rejection_reason.clone(),
        });

        Ok(rejected)
    }

    /// Record the impact report. Completes the submission whether on
    /// time or late; the notification carries the awarded credit, 0
    /// signalling "late".
    pub async fn submit_report(&self, id: Uuid, report: &ReportInput) -> Result<Submission> {
        let current = self.get(id).await?;
        let completed = self.engine.submit_report(current, report, Utc::now())?;
        self.store.update(&completed).await?;
        tracing::info!(id = %id, credit = completed.report_credit, "report recorded");

        self.emit(NotifyEvent {
            kind: EventKind::ReportReceived,
            title: completed.title.clone(),
            creator_name: completed.creator_name.clone(),
            creator_email: completed.creator_email.clone(),
            link: completed.link.clone(),
            credit: Some(completed.report_credit),
            days_remaining: None,
            reason: None,
        });

        Ok(completed)
    }

    /// Move approved records past the grace window to awaiting-report.
    /// Returns the count mutated; already-advanced records are untouched.
    pub async fn advance_awaiting(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut advanced = 0;
        for sub in self.store.list_all().await? {
            if self.engine.should_advance(&sub, now) {
                self.store.update(&self.engine.advance(sub)).await?;
                advanced += 1;
            }
        }
        Ok(advanced)
    }

    /// Expire awaiting-report records past their deadline.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut expired = 0;
        for sub in self.store.list_all().await? {
            if self.engine.should_expire(&sub, now) {
                self.store.update(&self.engine.expire(sub)).await?;
                expired += 1;
            }
        }
        Ok(expired)
    }

    /// Send deadline reminders for awaiting-report records crossing a
    /// configured threshold. The per-threshold flags on the record keep
    /// each reminder to one delivery.
    pub async fn send_reminders(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut thresholds = self.engine.config().reminder_days.clone();
        thresholds.sort_unstable();

        let mut sent = 0;
        for sub in self.store.list_all().await? {
            if sub.status != Status::AwaitingReport {
                continue;
            }
            let Some(days) = sub.days_until_deadline(now) else {
                continue;
            };
            if days <= 0 {
                continue;
            }
            let Some(&threshold) = thresholds.iter().find(|&&t| days <= t) else {
                continue;
            };

            let mut sub = sub;
            // Only the 7/3/1 thresholds carry a dedup flag column.
            let flag = match threshold {
                7 => &mut sub.notified_7d,
                3 => &mut sub.notified_3d,
                1 => &mut sub.notified_1d,
                _ => continue,
            };
            if *flag {
                continue;
            }
            *flag = true;

            self.store.update(&sub).await?;
            self.emit(NotifyEvent {
                kind: EventKind::DeadlineReminder,
                title: sub.title.clone(),
                creator_name: sub.creator_name.clone(),
                creator_email: sub.creator_email.clone(),
                link: sub.link.clone(),
                credit: None,
                days_remaining: Some(days),
                reason: None,
            });
            sent += 1;
        }
        Ok(sent)
    }

    /// One full maintenance pass: advance, expire, remind.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary> {
        Ok(SweepSummary {
            advanced: self.advance_awaiting(now).await?,
            expired: self.expire_overdue(now).await?,
            reminders_sent: self.send_reminders(now).await?,
        })
    }

    pub async fn metrics(&self) -> Result<Metrics> {
        Ok(Metrics::compute(&self.store.list_all().await?, Utc::now()))
    }

    pub async fn charts(&self) -> Result<ChartMetrics> {
        Ok(ChartMetrics::compute(
            &self.store.list_all().await?,
            Utc::now(),
        ))
    }

    pub async fn payout_report(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PayoutReport> {
        Ok(PayoutReport::build(
            &self.store.list_all().await?,
            start,
            end,
        ))
    }

    pub async fn alerts(&self) -> Result<Vec<Alert>> {
        Ok(deadline_alerts(&self.store.list_all().await?, Utc::now()))
    }

    /// Deliver a notification after the state write has committed.
    /// Runs on its own task so a slow channel never stalls the caller;
    /// failures are logged and swallowed, never propagated.
    fn emit(&self, event: NotifyEvent) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if !notifier.notify(&event).await {
                tracing::warn!(kind = ?event.kind, title = %event.title, "notification not delivered");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryStore;
    use chrono::Duration;
    use credline_core::WorkflowConfig;

    fn service() -> (SubmissionService, Arc<MemoryStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = SubmissionService::new(
            store.clone(),
            WorkflowEngine::new(WorkflowConfig::default()),
            notifier.clone(),
        );
        (service, store, notifier)
    }

    fn input(title: &str, creator: &str) -> NewSubmission {
        NewSubmission {
            title: title.into(),
            link: "https://gems.example.com/x".into(),
            creator_name: creator.into(),
            creator_email: None,
            creator_sector: "Ops".into(),
            problem: "p".into(),
            description: "d".into(),
            usage_instructions: "u".into(),
            complexity: "media".into(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_email_and_notifies() {
        let (service, _, notifier) = service();
        let outcome = service.create(&input("Gem", "Ana Souza")).await.unwrap();

        assert!(!outcome.duplicate);
        assert_eq!(outcome.submission.creator_email, "ana.souza@example.com");
        assert_eq!(outcome.submission.status, Status::Pending);

        let events = notifier.settled(1).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::NewSubmission);
    }

    #[tokio::test]
    async fn test_create_suppresses_pending_duplicates() {
        let (service, _, notifier) = service();
        let first = service.create(&input("Gem", "Ana")).await.unwrap();
        let second = service.create(&input("Gem", "Ana")).await.unwrap();

        assert!(second.duplicate);
        assert_eq!(second.submission.id, first.submission.id);
        assert_eq!(service.list(&SubmissionFilter::default()).await.unwrap().len(), 1);
        // No notification for the suppressed duplicate.
        assert_eq!(notifier.settled(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_check_only_matches_pending() {
        let (service, _, _) = service();
        let first = service.create(&input("Gem", "Ana")).await.unwrap();
        service.approve(first.submission.id).await.unwrap();

        let second = service.create(&input("Gem", "Ana")).await.unwrap();
        assert!(!second.duplicate);
    }

    #[tokio::test]
    async fn test_full_on_time_lifecycle() {
        let (service, _, notifier) = service();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;

        let approved = service.approve(id).await.unwrap();
        assert_eq!(approved.status, Status::Approved);
        assert_eq!(approved.total_credit, 15.0);

        let report = ReportInput {
            result: "ok".into(),
            improvement: "better".into(),
            learnings: "learned".into(),
        };
        let completed = service.submit_report(id, &report).await.unwrap();
        assert_eq!(completed.status, Status::Completed);
        assert_eq!(completed.total_credit, 50.0);

        let kinds: Vec<EventKind> = notifier.settled(3).await.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::NewSubmission,
                EventKind::Approved,
                EventKind::ReportReceived
            ]
        );
    }

    #[tokio::test]
    async fn test_late_report_completes_without_bonus() {
        let (service, store, _) = service();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;
        service.approve(id).await.unwrap();

        // Pull the deadline into the past.
        let mut sub = store.get_by_id(id).await.unwrap().unwrap();
        sub.report_deadline = Some(Utc::now() - Duration::days(1));
        store.update(&sub).await.unwrap();

        let report = ReportInput {
            result: "ok".into(),
            improvement: "better".into(),
            learnings: "learned".into(),
        };
        let completed = service.submit_report(id, &report).await.unwrap();
        assert_eq!(completed.status, Status::Completed);
        assert_eq!(completed.report_credit, 0.0);
        assert_eq!(completed.total_credit, 15.0);
    }

    #[tokio::test]
    async fn test_reject_records_reason() {
        let (service, _, _) = service();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;

        let rejected = service
            .reject(id, Some("duplicate link".into()))
            .await
            .unwrap();
        assert_eq!(rejected.status, Status::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("duplicate link"));
        assert_eq!(rejected.total_credit, 0.0);
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_record_unchanged() {
        let (service, store, _) = service();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;
        service.reject(id, None).await.unwrap();

        let err = service.approve(id).await.unwrap_err();
        assert!(matches!(err, CredlineError::InvalidTransition { .. }));

        let sub = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(sub.status, Status::Rejected);
        assert!(sub.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (service, _, _) = service();
        let err = service.approve(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CredlineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_advance_is_idempotent() {
        let (service, _, _) = service();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;
        service.approve(id).await.unwrap();

        let later = Utc::now() + Duration::hours(25);
        assert_eq!(service.advance_awaiting(later).await.unwrap(), 1);
        assert_eq!(service.advance_awaiting(later).await.unwrap(), 0);

        let sub = service.get(id).await.unwrap();
        assert_eq!(sub.status, Status::AwaitingReport);
    }

    #[tokio::test]
    async fn test_expire_overdue_is_idempotent() {
        let (service, store, _) = service();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;
        service.approve(id).await.unwrap();
        service
            .advance_awaiting(Utc::now() + Duration::hours(25))
            .await
            .unwrap();

        let mut sub = store.get_by_id(id).await.unwrap().unwrap();
        sub.report_deadline = Some(Utc::now() - Duration::seconds(1));
        store.update(&sub).await.unwrap();

        assert_eq!(service.expire_overdue(Utc::now()).await.unwrap(), 1);
        assert_eq!(service.expire_overdue(Utc::now()).await.unwrap(), 0);
        assert_eq!(service.get(id).await.unwrap().status, Status::Expired);
    }

    #[tokio::test]
    async fn test_reminders_deduped_per_threshold() {
        let (service, _, notifier) = service();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;
        service.approve(id).await.unwrap();
        service
            .advance_awaiting(Utc::now() + Duration::hours(25))
            .await
            .unwrap();

        // Deadline is 15 days out; 9 days in, under 6 days remain.
        let at_6_days = Utc::now() + Duration::days(9);
        assert_eq!(service.send_reminders(at_6_days).await.unwrap(), 1);
        assert_eq!(service.send_reminders(at_6_days).await.unwrap(), 0);

        // Crossing the 3-day threshold fires a second reminder.
        let at_2_days = Utc::now() + Duration::days(12) + Duration::hours(12);
        assert_eq!(service.send_reminders(at_2_days).await.unwrap(), 1);

        let sub = service.get(id).await.unwrap();
        assert!(sub.notified_7d);
        assert!(sub.notified_3d);
        assert!(!sub.notified_1d);

        let reminders = notifier
            .settled(4)
            .await
            .iter()
            .filter(|e| e.kind == EventKind::DeadlineReminder)
            .count();
        assert_eq!(reminders, 2);
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts_newest_first() {
        let (service, _, _) = service();
        let mut older = input("Older gem", "Ana");
        older.created_at = Some(Utc::now() - Duration::days(2));
        service.create(&older).await.unwrap();
        service.create(&input("Newer gem", "Bruno")).await.unwrap();

        let all = service.list(&SubmissionFilter::default()).await.unwrap();
        assert_eq!(all[0].title, "Newer gem");

        let filter = SubmissionFilter {
            search: Some("older".into()),
            ..Default::default()
        };
        let found = service.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Older gem");
    }

    #[tokio::test]
    async fn test_batch_intake() {
        let (service, _, _) = service();
        let outcomes = service
            .create_batch(&[input("One", "Ana"), input("Two", "Bruno")])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(service.list(&SubmissionFilter::default()).await.unwrap().len(), 2);
    }

    /// Stalls five seconds per delivery, then reports failure.
    struct StallingNotifier;

    #[async_trait::async_trait]
    impl Notifier for StallingNotifier {
        async fn notify(&self, _event: &NotifyEvent) -> bool {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            false
        }
    }

    #[tokio::test]
    async fn test_mutations_do_not_wait_on_the_notifier() {
        let service = SubmissionService::new(
            Arc::new(MemoryStore::new()),
            WorkflowEngine::new(WorkflowConfig::default()),
            Arc::new(StallingNotifier),
        );

        let started = std::time::Instant::now();
        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;
        let approved = service.approve(id).await.unwrap();

        assert_eq!(approved.status, Status::Approved);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    /// Refuses every delivery without stalling.
    struct RefusingNotifier;

    #[async_trait::async_trait]
    impl Notifier for RefusingNotifier {
        async fn notify(&self, _event: &NotifyEvent) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_fail_the_transition() {
        let store = Arc::new(MemoryStore::new());
        let service = SubmissionService::new(
            store.clone(),
            WorkflowEngine::new(WorkflowConfig::default()),
            Arc::new(RefusingNotifier),
        );

        let id = service.create(&input("Gem", "Ana")).await.unwrap().submission.id;
        let approved = service.approve(id).await.unwrap();
        assert_eq!(approved.status, Status::Approved);

        // The failed delivery left the committed write intact.
        let sub = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(sub.status, Status::Approved);
        assert_eq!(sub.total_credit, 15.0);
    }

    #[tokio::test]
    async fn test_payout_report_for_empty_period() {
        let (service, _, _) = service();
        let now = Utc::now();
        let report = service
            .payout_report(now - Duration::days(7), now)
            .await
            .unwrap();
        assert!(report.items.is_empty());
        assert_eq!(report.grand_total, 0.0);
    }
}
