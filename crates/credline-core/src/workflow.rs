//! The status-transition engine.
//!
//! Every operation is pure: it takes the current record plus an explicit
//! `now`, and returns the mutated record or a rejection. Persistence and
//! notification happen in the service layer, after the engine has fully
//! validated the transition.

use chrono::{DateTime, Duration, Utc};

use crate::config::WorkflowConfig;
use crate::error::{CredlineError, Result};
use crate::model::{ReportInput, Status, Submission};

/// Validates transitions and computes the resulting field mutations.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    config: WorkflowConfig,
}

impl WorkflowEngine {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Approve a pending submission. Sets the approval timestamp, the
    /// report deadline and the creation credit in one step.
    pub fn approve(&self, mut sub: Submission, now: DateTime<Utc>) -> Result<Submission> {
        if sub.status != Status::Pending {
            return Err(CredlineError::InvalidTransition {
                current: sub.status,
            });
        }

        sub.status = Status::Approved;
        sub.approved_at = Some(now);
        sub.report_deadline = Some(now + Duration::days(self.config.report_deadline_days));
        sub.creation_credit = self.config.creation_credit;
        sub.total_credit = sub.creation_credit + sub.report_credit;
        Ok(sub)
    }

    /// Reject a pending submission, optionally recording the reason.
    pub fn reject(
        &self,
        mut sub: Submission,
        reason: Option<String>,
    ) -> Result<Submission> {
        if sub.status != Status::Pending {
            return Err(CredlineError::InvalidTransition {
                current: sub.status,
            });
        }

        sub.status = Status::Rejected;
        if reason.is_some() {
            sub.rejection_reason = reason;
        }
        Ok(sub)
    }

    /// Record the impact report. The submission completes whether or not
    /// the deadline was met; a late report only forfeits the bonus.
    pub fn submit_report(
        &self,
        mut sub: Submission,
        report: &ReportInput,
        now: DateTime<Utc>,
    ) -> Result<Submission> {
        if !matches!(sub.status, Status::Approved | Status::AwaitingReport) {
            return Err(CredlineError::InvalidTransition {
                current: sub.status,
            });
        }
        report.validate()?;

        let on_time = sub.report_deadline.is_some_and(|deadline| now <= deadline);

        sub.status = Status::Completed;
        sub.report_submitted_at = Some(now);
        sub.report_result = Some(report.result.clone());
        sub.report_improvement = Some(report.improvement.clone());
        sub.report_learnings = Some(report.learnings.clone());
        sub.report_credit = if on_time { self.config.report_credit } else { 0.0 };
        sub.total_credit = sub.creation_credit + sub.report_credit;
        Ok(sub)
    }

    /// Whether an approved record has sat past the grace window and
    /// should move to awaiting-report.
    pub fn should_advance(&self, sub: &Submission, now: DateTime<Utc>) -> bool {
        sub.status == Status::Approved
            && sub.approved_at.is_some_and(|approved| {
                now - approved >= Duration::hours(self.config.awaiting_grace_hours)
            })
    }

    /// Move an approved record to awaiting-report.
    pub fn advance(&self, mut sub: Submission) -> Submission {
        sub.status = Status::AwaitingReport;
        sub
    }

    /// Whether an awaiting-report record has blown its deadline.
    pub fn should_expire(&self, sub: &Submission, now: DateTime<Utc>) -> bool {
        sub.status == Status::AwaitingReport
            && sub.report_deadline.is_some_and(|deadline| now > deadline)
    }

    /// Expire an awaiting-report record.
    pub fn expire(&self, mut sub: Submission) -> Submission {
        sub.status = Status::Expired;
        sub
    }
}
