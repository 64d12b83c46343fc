use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CredlineError, Result};

/// Root configuration for credline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredlineConfig {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Credit amounts and deadline windows.
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Record store backend.
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat webhook notifier.
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Periodic sweeper.
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

impl CredlineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CredlineError::Config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| CredlineError::Config(format!("Failed to parse config: {e}")))
    }
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "credline".to_string()
}

/// Credit amounts and deadline windows, injected into the workflow
/// engine at construction. Immutable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Credit awarded when a submission is approved.
    #[serde(default = "default_creation_credit")]
    pub creation_credit: f64,

    /// Credit awarded when the impact report lands before the deadline.
    #[serde(default = "default_report_credit")]
    pub report_credit: f64,

    /// Days between approval and the report deadline.
    #[serde(default = "default_report_deadline_days")]
    pub report_deadline_days: i64,

    /// Hours after approval before a record moves to awaiting-report.
    #[serde(default = "default_awaiting_grace_hours")]
    pub awaiting_grace_hours: i64,

    /// Days-remaining thresholds that trigger a deadline reminder.
    #[serde(default = "default_reminder_days")]
    pub reminder_days: Vec<i64>,

    /// Domain used to derive a creator email when intake omits one.
    #[serde(default = "default_mail_domain")]
    pub mail_domain: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            creation_credit: default_creation_credit(),
            report_credit: default_report_credit(),
            report_deadline_days: default_report_deadline_days(),
            awaiting_grace_hours: default_awaiting_grace_hours(),
            reminder_days: default_reminder_days(),
            mail_domain: default_mail_domain(),
        }
    }
}

fn default_creation_credit() -> f64 {
    15.0
}

fn default_report_credit() -> f64 {
    35.0
}

fn default_report_deadline_days() -> i64 {
    15
}

fn default_awaiting_grace_hours() -> i64 {
    24
}

fn default_reminder_days() -> Vec<i64> {
    vec![7, 3, 1]
}

fn default_mail_domain() -> String {
    "example.com".to_string()
}

/// Record store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend kind.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Postgres connection URL, required for the postgres backend.
    #[serde(default)]
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: None,
        }
    }
}

/// Available store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP port.
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Enable CORS.
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; `*` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            cors_enabled: default_cors_enabled(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_cors_enabled() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Chat webhook notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifierConfig {
    /// Incoming-webhook URL. Notifications are skipped when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Periodic sweeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Whether the in-process sweeper loop runs alongside the gateway.
    #[serde(default = "default_sweeper_enabled")]
    pub enabled: bool,

    /// Seconds between sweep passes.
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: default_sweeper_enabled(),
            interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweeper_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    15 * 60
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CredlineConfig::default();
        assert_eq!(config.workflow.creation_credit, 15.0);
        assert_eq!(config.workflow.report_credit, 35.0);
        assert_eq!(config.workflow.report_deadline_days, 15);
        assert_eq!(config.workflow.reminder_days, vec![7, 3, 1]);
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [store]
            backend = "postgres"
            database_url = "postgres://localhost/credline"
        "#;

        let config = CredlineConfig::parse_toml(toml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.workflow.report_deadline_days, 15);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [project]
            name = "credline-staging"

            [workflow]
            creation_credit = 20.0
            report_credit = 40.0
            report_deadline_days = 10
            reminder_days = [5, 1]

            [gateway]
            port = 3000
            cors_origins = ["https://dash.example.com"]

            [sweeper]
            interval_secs = 60
        "#;

        let config = CredlineConfig::parse_toml(toml).unwrap();
        assert_eq!(config.project.name, "credline-staging");
        assert_eq!(config.workflow.creation_credit, 20.0);
        assert_eq!(config.workflow.reminder_days, vec![5, 1]);
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.sweeper.interval_secs, 60);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_CREDLINE_DB", "postgres://test@localhost/test");

        let toml = r#"
            [store]
            backend = "postgres"
            database_url = "${TEST_CREDLINE_DB}"
        "#;

        let config = CredlineConfig::parse_toml(toml).unwrap();
        assert_eq!(
            config.store.database_url.as_deref(),
            Some("postgres://test@localhost/test")
        );

        std::env::remove_var("TEST_CREDLINE_DB");
    }
}
