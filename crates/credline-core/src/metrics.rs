//! Dashboard metrics, recomputed on every request.
//!
//! All functions are pure reads over the full record set. The table is
//! small; freshness matters more than efficiency, so nothing here keeps
//! incremental state.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Status, Submission};

/// Midnight UTC on the Sunday of the week containing `t`.
pub fn start_of_week(t: DateTime<Utc>) -> DateTime<Utc> {
    let date = t.date_naive() - Duration::days(t.weekday().num_days_from_sunday() as i64);
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
}

/// Midnight UTC on the first day of the month containing `t`.
pub fn start_of_month(t: DateTime<Utc>) -> DateTime<Utc> {
    let date = t.date_naive().with_day(1).unwrap();
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Headline dashboard numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub total_submissions: usize,
    pub awaiting_approval: usize,
    pub awaiting_report: usize,
    /// Completed as a percentage of everything past approval, one decimal.
    pub completion_rate: f64,
    /// Total credit on records approved this calendar month.
    pub credited_this_month: f64,
    /// Total credit payable on records approved this week (Sunday start).
    pub payable_this_week: f64,
}

impl Metrics {
    pub fn compute(subs: &[Submission], now: DateTime<Utc>) -> Self {
        let month_start = start_of_month(now);
        let week_start = start_of_week(now);

        let awaiting_approval = subs.iter().filter(|s| s.status == Status::Pending).count();
        let awaiting_report = subs
            .iter()
            .filter(|s| s.status == Status::AwaitingReport)
            .count();

        let past_approval = subs.iter().filter(|s| s.status.is_past_approval()).count();
        let completed = subs.iter().filter(|s| s.status == Status::Completed).count();
        let completion_rate = if past_approval > 0 {
            round1(completed as f64 / past_approval as f64 * 100.0)
        } else {
            0.0
        };

        // Seeded with positive zero so empty totals serialize as 0.0, not -0.0.
        let credited_this_month = subs
            .iter()
            .filter(|s| s.approved_at.is_some_and(|a| a >= month_start))
            .fold(0.0, |acc, s| acc + s.total_credit);

        let payable_this_week = subs
            .iter()
            .filter(|s| s.approved_at.is_some_and(|a| a >= week_start) && s.total_credit > 0.0)
            .fold(0.0, |acc, s| acc + s.total_credit);

        Self {
            total_submissions: subs.len(),
            awaiting_approval,
            awaiting_report,
            completion_rate,
            credited_this_month,
            payable_this_week,
        }
    }
}

/// One per-status count, in fixed display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

/// One Sunday-aligned week bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekPoint {
    /// Bucket label, `dd/MM` of the week's Sunday.
    pub week: String,
    pub value: f64,
}

/// A creator on the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorCount {
    pub name: String,
    pub email: String,
    pub count: usize,
}

/// Chart series for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartMetrics {
    pub by_status: Vec<StatusCount>,
    /// Creations per week, last 8 buckets, current week inclusive.
    pub creations_per_week: Vec<WeekPoint>,
    /// Completed / approved (as a percentage) among records approved in
    /// each bucket; 0 when none were approved.
    pub report_rate_per_week: Vec<WeekPoint>,
    /// Top 10 creators by submission count.
    pub top_creators: Vec<CreatorCount>,
}

impl ChartMetrics {
    pub fn compute(subs: &[Submission], now: DateTime<Utc>) -> Self {
        let by_status = Status::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: subs.iter().filter(|s| s.status == status).count(),
            })
            .collect();

        let this_week = start_of_week(now);
        let mut creations_per_week = Vec::with_capacity(8);
        let mut report_rate_per_week = Vec::with_capacity(8);

        for i in (0..8).rev() {
            let bucket_start = this_week - Duration::weeks(i);
            let bucket_end = bucket_start + Duration::weeks(1);
            let week = bucket_start.format("%d/%m").to_string();

            let created = subs
                .iter()
                .filter(|s| s.created_at >= bucket_start && s.created_at < bucket_end)
                .count();
            creations_per_week.push(WeekPoint {
                week: week.clone(),
                value: created as f64,
            });

            let approved: Vec<&Submission> = subs
                .iter()
                .filter(|s| {
                    s.approved_at
                        .is_some_and(|a| a >= bucket_start && a < bucket_end)
                })
                .collect();
            let completed = approved
                .iter()
                .filter(|s| s.status == Status::Completed)
                .count();
            let rate = if approved.is_empty() {
                0.0
            } else {
                round1(completed as f64 / approved.len() as f64 * 100.0)
            };
            report_rate_per_week.push(WeekPoint { week, value: rate });
        }

        let mut creators: Vec<CreatorCount> = Vec::new();
        for sub in subs {
            match creators.iter().position(|c| c.email == sub.creator_email) {
                Some(idx) => creators[idx].count += 1,
                None => creators.push(CreatorCount {
                    name: sub.creator_name.clone(),
                    email: sub.creator_email.clone(),
                    count: 1,
                }),
            }
        }
        creators.sort_by(|a, b| b.count.cmp(&a.count));
        creators.truncate(10);

        Self {
            by_status,
            creations_per_week,
            report_rate_per_week,
            top_creators: creators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::model::{Complexity, NewSubmission, ReportInput};
    use crate::workflow::WorkflowEngine;
    use chrono::Weekday;

    fn submission(title: &str, email: &str) -> Submission {
        let input = NewSubmission {
            title: title.into(),
            link: "https://gems.example.com/x".into(),
            creator_name: email.split('@').next().unwrap().into(),
            creator_email: Some(email.into()),
            creator_sector: "Ops".into(),
            problem: "p".into(),
            description: "d".into(),
            usage_instructions: "u".into(),
            complexity: "LOW".into(),
            created_at: None,
        };
        Submission::new(&input, Complexity::Low, email.into())
    }

    fn completed(title: &str, email: &str, now: DateTime<Utc>) -> Submission {
        let eng = WorkflowEngine::new(WorkflowConfig::default());
        let approved = eng.approve(submission(title, email), now).unwrap();
        eng.submit_report(
            approved,
            &ReportInput {
                result: "r".into(),
                improvement: "i".into(),
                learnings: "l".into(),
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_start_of_week_is_sunday_midnight() {
        let now = Utc::now();
        let start = start_of_week(now);
        assert_eq!(start.weekday(), Weekday::Sun);
        assert_eq!(start.time(), chrono::NaiveTime::MIN);
        assert!(start <= now);
        assert!(now - start < Duration::weeks(1));
    }

    #[test]
    fn test_metrics_on_empty_set() {
        let m = Metrics::compute(&[], Utc::now());
        assert_eq!(m.total_submissions, 0);
        assert_eq!(m.completion_rate, 0.0);
        assert_eq!(m.credited_this_month, 0.0);
        // Empty totals must carry positive sign, or they render as "-0.0".
        assert!(m.credited_this_month.is_sign_positive());
        assert!(m.payable_this_week.is_sign_positive());
    }

    #[test]
    fn test_completion_rate_counts_past_approval_only() {
        let now = Utc::now();
        let eng = WorkflowEngine::new(WorkflowConfig::default());

        let subs = vec![
            submission("pending", "a@x.com"),
            eng.reject(submission("rejected", "b@x.com"), None).unwrap(),
            eng.approve(submission("approved", "c@x.com"), now).unwrap(),
            completed("done", "d@x.com", now),
        ];

        let m = Metrics::compute(&subs, now);
        // 1 completed of 2 past approval; pending and rejected excluded.
        assert_eq!(m.completion_rate, 50.0);
        assert_eq!(m.awaiting_approval, 1);
    }

    #[test]
    fn test_credited_totals_track_approval_date() {
        let now = Utc::now();
        let m = Metrics::compute(&[completed("done", "a@x.com", now)], now);
        assert_eq!(m.credited_this_month, 50.0);
        assert_eq!(m.payable_this_week, 50.0);
    }

    #[test]
    fn test_charts_have_eight_week_buckets() {
        let now = Utc::now();
        let charts = ChartMetrics::compute(&[submission("s", "a@x.com")], now);

        assert_eq!(charts.creations_per_week.len(), 8);
        assert_eq!(charts.report_rate_per_week.len(), 8);
        // The record was created just now, so it lands in the last bucket.
        assert_eq!(charts.creations_per_week[7].value, 1.0);
        assert_eq!(charts.by_status.len(), 6);
    }

    #[test]
    fn test_report_rate_bucket() {
        let now = Utc::now();
        let eng = WorkflowEngine::new(WorkflowConfig::default());
        let subs = vec![
            completed("done", "a@x.com", now),
            eng.approve(submission("open", "b@x.com"), now).unwrap(),
        ];

        let charts = ChartMetrics::compute(&subs, now);
        assert_eq!(charts.report_rate_per_week[7].value, 50.0);
        assert_eq!(charts.report_rate_per_week[0].value, 0.0);
    }

    #[test]
    fn test_top_creators_sorted_and_capped() {
        let mut subs = Vec::new();
        for i in 0..12 {
            let email = format!("creator{i}@x.com");
            subs.push(submission("one", &email));
        }
        subs.push(submission("two", "creator0@x.com"));

        let charts = ChartMetrics::compute(&subs, Utc::now());
        assert_eq!(charts.top_creators.len(), 10);
        assert_eq!(charts.top_creators[0].email, "creator0@x.com");
        assert_eq!(charts.top_creators[0].count, 2);
    }
}
