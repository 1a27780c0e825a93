use std::fmt;

use rusqlite;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentErrorCode {
    MissingApiKey,
    Forbidden,
    HttpTimeout,
    RateLimited,
    InvalidResponse,
    InvalidRequest,
    ProviderUnavailable,
    Unknown,
}

impl IntentErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentErrorCode::MissingApiKey => "MISSING_API_KEY",
            IntentErrorCode::Forbidden => "FORBIDDEN",
            IntentErrorCode::HttpTimeout => "HTTP_TIMEOUT",
            IntentErrorCode::RateLimited => "RATE_LIMITED",
            IntentErrorCode::InvalidResponse => "INVALID_RESPONSE",
            IntentErrorCode::InvalidRequest => "INVALID_REQUEST",
            IntentErrorCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            IntentErrorCode::Unknown => "UNKNOWN_INTENT_ERROR",
        }
    }
}

impl fmt::Display for IntentErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("record not found")]
    NotFound,

    #[error("conflicting record: {message}")]
    Conflict { message: String },

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        details: Option<JsonValue>,
    },

    #[error("{message}")]
    Intent {
        code: IntentErrorCode,
        message: String,
        correlation_id: Option<String>,
        details: Option<JsonValue>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "validation error");
        AppError::Validation {
            message,
            source: None,
            details: None,
        }
    }

    pub fn validation_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "validation error with details");
        AppError::Validation {
            message,
            source: None,
            details: Some(details),
        }
    }

    pub fn intent(code: IntentErrorCode, message: impl Into<String>) -> Self {
        Self::intent_with_details(code, message, None, None)
    }

    pub fn intent_with_details(
        code: IntentErrorCode,
        message: impl Into<String>,
        correlation_id: Option<&str>,
        details: Option<JsonValue>,
    ) -> Self {
        let message = message.into();
        let correlation = correlation_id.map(|value| value.to_string());
        match (&correlation, &details) {
            (Some(id), Some(payload)) => {
                warn!(
                    target: "app::intent::error",
                    code = %code,
                    correlation_id = %id,
                    details = %payload,
                    %message
                );
            }
            (Some(id), None) => {
                warn!(
                    target: "app::intent::error",
                    code = %code,
                    correlation_id = %id,
                    %message
                );
            }
            (None, Some(payload)) => {
                warn!(target: "app::intent::error", code = %code, details = %payload, %message);
            }
            (None, None) => {
                warn!(target: "app::intent::error", code = %code, %message);
            }
        }

        AppError::Intent {
            code,
            message,
            correlation_id: correlation,
            details,
        }
    }

    pub fn intent_code(&self) -> Option<IntentErrorCode> {
        match self {
            AppError::Intent { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn intent_correlation_id(&self) -> Option<&str> {
        match self {
            AppError::Intent { correlation_id, .. } => correlation_id.as_deref(),
            _ => None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::conflict", %message, "conflict error");
        AppError::Conflict { message }
    }

    pub fn not_found() -> Self {
        warn!(target: "app::database", "resource not found");
        AppError::NotFound
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::database", %message, "database error");
        AppError::Database { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::Error::{QueryReturnedNoRows, SqliteFailure};
        use rusqlite::ErrorCode;

        match &error {
            QueryReturnedNoRows => AppError::not_found(),
            SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                AppError::conflict("unique or foreign key constraint violated")
            }
            _ => {
                error!(target: "app::database", error = ?error, "sqlite error");
                AppError::database(error.to_string())
            }
        }
    }
}
