use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CredlineError, Result};

static EMAIL_RE: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Lifecycle status of a submission.
///
/// `Rejected`, `Completed` and `Expired` are terminal; no transition
/// reopens them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Approved,
    AwaitingReport,
    Completed,
    Expired,
    Rejected,
}

impl Status {
    /// All statuses, in dashboard display order.
    pub const ALL: [Status; 6] = [
        Status::Pending,
        Status::Approved,
        Status::AwaitingReport,
        Status::Completed,
        Status::Expired,
        Status::Rejected,
    ];

    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::AwaitingReport => "AWAITING_REPORT",
            Self::Completed => "COMPLETED",
            Self::Expired => "EXPIRED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parse from a stored string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "AWAITING_REPORT" => Ok(Self::AwaitingReport),
            "COMPLETED" => Ok(Self::Completed),
            "EXPIRED" => Ok(Self::Expired),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(CredlineError::Storage(format!("unknown status: {other}"))),
        }
    }

    /// Whether the record has passed the approval gate. These are the
    /// records counted in the completion-rate denominator.
    pub fn is_past_approval(&self) -> bool {
        matches!(
            self,
            Self::Approved | Self::AwaitingReport | Self::Completed | Self::Expired
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared complexity of a submission. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parse a user-supplied complexity value. Case-insensitive and
    /// accent-insensitive, so `média` and `Medium` both resolve.
    pub fn parse(s: &str) -> Result<Self> {
        match fold_accents(s).to_uppercase().as_str() {
            "LOW" | "BAIXA" => Ok(Self::Low),
            "MEDIUM" | "MEDIA" => Ok(Self::Medium),
            "HIGH" | "ALTA" => Ok(Self::High),
            _ => Err(CredlineError::Validation(format!(
                "Invalid complexity '{s}'. Use: LOW, MEDIUM or HIGH"
            ))),
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip diacritics from Latin vowels and cedilla.
fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// One tracked submission, the sole entity in the system.
///
/// Identity and descriptive fields are immutable after creation. Status,
/// timestamps and credits are mutated only by the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub title: String,
    pub link: String,
    pub creator_name: String,
    pub creator_email: String,
    pub creator_sector: String,
    pub problem: String,
    pub description: String,
    pub usage_instructions: String,
    pub complexity: Complexity,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub report_deadline: Option<DateTime<Utc>>,
    pub report_submitted_at: Option<DateTime<Utc>>,
    pub report_result: Option<String>,
    pub report_improvement: Option<String>,
    pub report_learnings: Option<String>,
    pub rejection_reason: Option<String>,
    pub creation_credit: f64,
    pub report_credit: f64,
    pub total_credit: f64,
    /// Reminder dedup flags, one per configured reminder threshold.
    pub notified_7d: bool,
    pub notified_3d: bool,
    pub notified_1d: bool,
}

impl Submission {
    /// Build a fresh `Pending` record from validated input. All derived
    /// fields start empty or zero.
    pub fn new(input: &NewSubmission, complexity: Complexity, creator_email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            link: input.link.clone(),
            creator_name: input.creator_name.clone(),
            creator_email,
            creator_sector: input.creator_sector.clone(),
            problem: input.problem.clone(),
            description: input.description.clone(),
            usage_instructions: input.usage_instructions.clone(),
            complexity,
            status: Status::Pending,
            created_at: input.created_at.unwrap_or_else(Utc::now),
            approved_at: None,
            report_deadline: None,
            report_submitted_at: None,
            report_result: None,
            report_improvement: None,
            report_learnings: None,
            rejection_reason: None,
            creation_credit: 0.0,
            report_credit: 0.0,
            total_credit: 0.0,
            notified_7d: false,
            notified_3d: false,
            notified_1d: false,
        }
    }

    /// Whole days from `now` until the report deadline, negative once past.
    pub fn days_until_deadline(&self, now: DateTime<Utc>) -> Option<i64> {
        self.report_deadline.map(|d| (d - now).num_days())
    }
}

/// Input payload for creating a submission, from the form or the
/// webhook intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubmission {
    pub title: String,
    pub link: String,
    pub creator_name: String,
    #[serde(default)]
    pub creator_email: Option<String>,
    pub creator_sector: String,
    pub problem: String,
    pub description: String,
    pub usage_instructions: String,
    pub complexity: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewSubmission {
    /// Validate all required fields. Returns the parsed complexity on
    /// success; the error message names every missing field.
    pub fn validate(&self) -> Result<Complexity> {
        let required = [
            ("title", &self.title),
            ("link", &self.link),
            ("creator_name", &self.creator_name),
            ("creator_sector", &self.creator_sector),
            ("problem", &self.problem),
            ("description", &self.description),
            ("usage_instructions", &self.usage_instructions),
            ("complexity", &self.complexity),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(CredlineError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        if url::Url::parse(&self.link).is_err() {
            return Err(CredlineError::Validation(format!(
                "Invalid link URL: {}",
                self.link
            )));
        }

        if let Some(email) = &self.creator_email {
            if !EMAIL_RE.is_match(email) {
                return Err(CredlineError::Validation(format!("Invalid email: {email}")));
            }
        }

        Complexity::parse(&self.complexity)
    }

    /// Creator email, derived from the name when the intake payload
    /// carries none: lowercased, spaces collapsed to dots.
    pub fn resolved_email(&self, mail_domain: &str) -> String {
        match &self.creator_email {
            Some(email) => email.clone(),
            None => {
                let local: String = self
                    .creator_name
                    .to_lowercase()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(".");
                format!("{local}@{mail_domain}")
            }
        }
    }
}

/// Input payload for the impact report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    pub result: String,
    pub improvement: String,
    pub learnings: String,
}

impl ReportInput {
    /// All three fields are required; the error names the first blank one.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("result", &self.result),
            ("improvement", &self.improvement),
            ("learnings", &self.learnings),
        ] {
            if value.trim().is_empty() {
                return Err(CredlineError::Validation(format!(
                    "Missing required field: {name}"
                )));
            }
        }
        Ok(())
    }
}

/// Listing filters. Empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionFilter {
    pub status: Option<Status>,
    pub creator_email: Option<String>,
    pub sector: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    /// Case-insensitive search over title and creator name.
    pub search: Option<String>,
}

impl SubmissionFilter {
    pub fn matches(&self, sub: &Submission) -> bool {
        if let Some(status) = self.status {
            if sub.status != status {
                return false;
            }
        }
        if let Some(email) = &self.creator_email {
            if &sub.creator_email != email {
                return false;
            }
        }
        if let Some(sector) = &self.sector {
            if &sub.creator_sector != sector {
                return false;
            }
        }
        if let Some(start) = self.period_start {
            if sub.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.period_end {
            if sub.created_at > end {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !sub.title.to_lowercase().contains(&needle)
                && !sub.creator_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}
