use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use credline_core::CredlineError;

/// Uniform JSON envelope for every API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// Result data (if successful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error information (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ApiResponse {
    /// Create a successful response.
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            self.error
                .as_ref()
                .map(|e| e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        };

        (status, Json(self)).into_response()
    }
}

/// Error information inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "INVALID_TRANSITION" => StatusCode::CONFLICT,
            "EXTERNAL_SERVICE" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }
}

impl From<CredlineError> for ApiError {
    fn from(e: CredlineError) -> Self {
        let code = match &e {
            CredlineError::NotFound(_) => "NOT_FOUND",
            CredlineError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CredlineError::Validation(_) => "VALIDATION_ERROR",
            CredlineError::ExternalService(_) => "EXTERNAL_SERVICE",
            CredlineError::Config(_) | CredlineError::Storage(_) | CredlineError::Serialization(_) => {
                "INTERNAL_ERROR"
            }
        };
        Self::new(code, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credline_core::Status;

    #[test]
    fn test_error_codes_map_to_statuses() {
        let not_found: ApiError = CredlineError::NotFound("submission x".into()).into();
        assert_eq!(not_found.code, "NOT_FOUND");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let conflict: ApiError = CredlineError::InvalidTransition {
            current: Status::Rejected,
        }
        .into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert!(conflict.message.contains("REJECTED"));

        let bad: ApiError = CredlineError::Validation("Missing required field: title".into()).into();
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

        let internal: ApiError = CredlineError::Storage("down".into()).into();
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
