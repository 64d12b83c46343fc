use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use credline_core::metrics::start_of_week;
use credline_core::{AlertKind, NewSubmission, ReportInput, Status, SubmissionFilter};

use crate::export::payout_csv;
use crate::service::SubmissionService;

use super::response::{ApiError, ApiResponse};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Query parameters for the listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub creator_email: Option<String>,
    pub sector: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<SubmissionFilter, ApiError> {
        let status = match self.status.as_deref() {
            Some(s) => Some(Status::parse(s).map_err(|_| {
                ApiError::validation(format!("unknown status filter: {s}"))
            })?),
            None => None,
        };
        Ok(SubmissionFilter {
            status,
            creator_email: self.creator_email,
            sector: self.sector,
            period_start: self.period_start,
            period_end: self.period_end,
            search: self.search,
        })
    }
}

pub async fn list_submissions(
    State(service): State<SubmissionService>,
    Query(query): Query<ListQuery>,
) -> ApiResponse {
    let filter = match query.into_filter() {
        Ok(filter) => filter,
        Err(e) => return ApiResponse::error(e),
    };
    match service.list(&filter).await {
        Ok(subs) => {
            let total = subs.len();
            ApiResponse::success(json!({ "submissions": subs, "total": total }))
        }
        Err(e) => ApiResponse::error(e.into()),
    }
}

pub async fn create_submission(
    State(service): State<SubmissionService>,
    Json(input): Json<NewSubmission>,
) -> Response {
    match service.create(&input).await {
        Ok(outcome) => {
            let status = if outcome.duplicate {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (status, Json(ApiResponse::success(json!(outcome)))).into_response()
        }
        Err(e) => ApiResponse::error(e.into()).into_response(),
    }
}

pub async fn get_submission(
    State(service): State<SubmissionService>,
    Path(id): Path<Uuid>,
) -> ApiResponse {
    match service.get(id).await {
        Ok(sub) => ApiResponse::success(json!(sub)),
        Err(e) => ApiResponse::error(e.into()),
    }
}

pub async fn approve_submission(
    State(service): State<SubmissionService>,
    Path(id): Path<Uuid>,
) -> ApiResponse {
    match service.approve(id).await {
        Ok(sub) => ApiResponse::success(json!(sub)),
        Err(e) => ApiResponse::error(e.into()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RejectBody {
    #[serde(default)]
    reason: Option<String>,
}

pub async fn reject_submission(
    State(service): State<SubmissionService>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResponse {
    // The reason is optional; so is the whole body.
    let reason = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<RejectBody>(&body) {
            Ok(parsed) => parsed.reason,
            Err(e) => return ApiResponse::error(ApiError::validation(format!("invalid body: {e}"))),
        }
    };

    match service.reject(id, reason).await {
        Ok(sub) => ApiResponse::success(json!(sub)),
        Err(e) => ApiResponse::error(e.into()),
    }
}

pub async fn submit_report(
    State(service): State<SubmissionService>,
    Path(id): Path<Uuid>,
    Json(report): Json<ReportInput>,
) -> ApiResponse {
    match service.submit_report(id, &report).await {
        Ok(sub) => {
            let message = if sub.report_credit > 0.0 {
                format!("Report recorded. Credit of R${:.2} added.", sub.report_credit)
            } else {
                "Report recorded past the deadline. No additional credit.".to_string()
            };
            ApiResponse::success(json!({ "submission": sub, "message": message }))
        }
        Err(e) => ApiResponse::error(e.into()),
    }
}

/// Intake accepts a single payload or an array of payloads.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IntakeBody {
    One(Box<NewSubmission>),
    Many(Vec<NewSubmission>),
}

pub async fn intake(
    State(service): State<SubmissionService>,
    Json(body): Json<IntakeBody>,
) -> Response {
    let inputs = match body {
        IntakeBody::One(input) => vec![*input],
        IntakeBody::Many(inputs) => inputs,
    };

    match service.create_batch(&inputs).await {
        Ok(outcomes) => {
            let created: Vec<_> = outcomes
                .iter()
                .map(|o| {
                    json!({
                        "id": o.submission.id,
                        "title": o.submission.title,
                        "status": o.submission.status,
                        "duplicate": o.duplicate,
                    })
                })
                .collect();
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    json!({ "submissions": created, "total": created.len() }),
                )),
            )
                .into_response()
        }
        Err(e) => ApiResponse::error(e.into()).into_response(),
    }
}

pub async fn metrics(State(service): State<SubmissionService>) -> ApiResponse {
    let snapshot = match service.metrics().await {
        Ok(m) => m,
        Err(e) => return ApiResponse::error(e.into()),
    };
    match service.charts().await {
        Ok(charts) => ApiResponse::success(json!({ "metrics": snapshot, "charts": charts })),
        Err(e) => ApiResponse::error(e.into()),
    }
}

/// Query parameters for the payout report.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// `this_week` (default) or `last_week`; ignored when explicit
    /// bounds are given.
    pub period: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

impl ReportQuery {
    fn resolve(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
        if let (Some(start), Some(end)) = (self.period_start, self.period_end) {
            return Ok((start, end));
        }
        let this_week = start_of_week(now);
        match self.period.as_deref() {
            None | Some("this_week") => Ok((this_week, this_week + Duration::weeks(1))),
            Some("last_week") => Ok((this_week - Duration::weeks(1), this_week)),
            Some(other) => Err(ApiError::validation(format!("unknown period: {other}"))),
        }
    }
}

pub async fn payout_report(
    State(service): State<SubmissionService>,
    Query(query): Query<ReportQuery>,
) -> ApiResponse {
    let (start, end) = match query.resolve(Utc::now()) {
        Ok(bounds) => bounds,
        Err(e) => return ApiResponse::error(e),
    };
    match service.payout_report(start, end).await {
        Ok(report) => ApiResponse::success(json!(report)),
        Err(e) => ApiResponse::error(e.into()),
    }
}

pub async fn export_payout_report(
    State(service): State<SubmissionService>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let (start, end) = match query.resolve(Utc::now()) {
        Ok(bounds) => bounds,
        Err(e) => return ApiResponse::error(e).into_response(),
    };
    match service.payout_report(start, end).await {
        Ok(report) => {
            let csv = payout_csv(&report);
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"payout-report.csv\"",
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(e) => ApiResponse::error(e.into()).into_response(),
    }
}

pub async fn alerts(State(service): State<SubmissionService>) -> ApiResponse {
    match service.alerts().await {
        Ok(alerts) => {
            let mut by_kind = std::collections::BTreeMap::new();
            for alert in &alerts {
                let key = match alert.kind {
                    AlertKind::NewSubmission => "NEW_SUBMISSION",
                    AlertKind::DeadlineSoon => "DEADLINE_SOON",
                    AlertKind::ReportReceived => "REPORT_RECEIVED",
                    AlertKind::Expired => "EXPIRED",
                };
                *by_kind.entry(key).or_insert(0usize) += 1;
            }
            ApiResponse::success(json!({
                "alerts": alerts,
                "meta": { "total": alerts.len(), "by_kind": by_kind },
            }))
        }
        Err(e) => ApiResponse::error(e.into()),
    }
}

pub async fn sweep(State(service): State<SubmissionService>) -> ApiResponse {
    match service.sweep(Utc::now()).await {
        Ok(summary) => ApiResponse::success(json!(summary)),
        Err(e) => ApiResponse::error(e.into()),
    }
}
