pub mod alerts;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod report;
pub mod workflow;

pub use alerts::{deadline_alerts, Alert, AlertKind};
pub use config::{CredlineConfig, WorkflowConfig};
pub use error::{CredlineError, Result};
pub use metrics::{ChartMetrics, Metrics};
pub use model::{
    Complexity, NewSubmission, ReportInput, Status, Submission, SubmissionFilter,
};
pub use report::{PayoutItem, PayoutReport};
pub use workflow::WorkflowEngine;
