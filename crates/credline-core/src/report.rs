//! Per-period payout reports, grouped by creator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Submission;

/// One contributing record inside a payout group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutLine {
    pub id: Uuid,
    pub title: String,
    pub creation_credit: f64,
    pub report_credit: f64,
}

/// Credits owed to one creator over the period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutItem {
    pub creator_name: String,
    pub creator_email: String,
    pub submission_count: usize,
    pub creation_credit_total: f64,
    pub report_credit_total: f64,
    pub total_credit: f64,
    pub submissions: Vec<PayoutLine>,
}

/// Payout report for a period, used for reimbursement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutReport {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub items: Vec<PayoutItem>,
    pub grand_total: f64,
}

impl PayoutReport {
    /// Build the report for records approved inside `[start, end]` that
    /// carry any credit, grouped by creator email, largest total first.
    pub fn build(subs: &[Submission], start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let qualifying = subs.iter().filter(|s| {
            s.approved_at.is_some_and(|a| a >= start && a <= end) && s.total_credit > 0.0
        });

        let mut items: Vec<PayoutItem> = Vec::new();
        for sub in qualifying {
            let idx = match items
                .iter()
                .position(|i| i.creator_email == sub.creator_email)
            {
                Some(idx) => idx,
                None => {
                    items.push(PayoutItem {
                        creator_name: sub.creator_name.clone(),
                        creator_email: sub.creator_email.clone(),
                        submission_count: 0,
                        creation_credit_total: 0.0,
                        report_credit_total: 0.0,
                        total_credit: 0.0,
                        submissions: Vec::new(),
                    });
                    items.len() - 1
                }
            };
            let item = &mut items[idx];

            item.submission_count += 1;
            item.creation_credit_total += sub.creation_credit;
            item.report_credit_total += sub.report_credit;
            item.total_credit += sub.total_credit;
            item.submissions.push(PayoutLine {
                id: sub.id,
                title: sub.title.clone(),
                creation_credit: sub.creation_credit,
                report_credit: sub.report_credit,
            });
        }

        items.sort_by(|a, b| b.total_credit.total_cmp(&a.total_credit));
        // Seed with positive zero so an empty report prints 0.00, not -0.00.
        let grand_total = items.iter().fold(0.0, |acc, i| acc + i.total_credit);

        Self {
            period_start: start,
            period_end: end,
            items,
            grand_total,
        }
    }
}
