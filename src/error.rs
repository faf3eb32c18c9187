use std::fmt;
use thiserror::Error;

/// Message surfaced whenever the server gave no usable error text.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

/// Application error types
///
/// Every variant that can come back from the network displays as a single
/// human-readable message; technical detail is kept for logging only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Server-reported failure (non-2xx response)
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport failure, timeout or undecodable response body
    #[error("Something went wrong")]
    Transport { detail: String },

    /// Client-side validation failure, never sent to the server
    #[error("{0}")]
    Validation(ValidationFailure),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A submission is already running for the open form or dialog
    #[error("Another action is still being submitted")]
    ActionInProgress,

    /// Submit or confirm was requested with nothing open
    #[error("No form or confirmation is open")]
    NoActiveAction,
}

impl AppError {
    /// Build an API error from a status and an optional server message
    pub fn api(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
        AppError::Api { status, message }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        AppError::Transport {
            detail: detail.into(),
        }
    }

    /// The message shown to the user
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// HTTP status reported by the server, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether re-issuing the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Transport { .. } => true,
            AppError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Api { .. } => "API_ERROR",
            AppError::Transport { .. } => "TRANSPORT_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::ActionInProgress => "ACTION_IN_PROGRESS",
            AppError::NoActiveAction => "NO_ACTIVE_ACTION",
        }
    }
}

/// A single field-level validation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level validation errors, sorted by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    pub fields: Vec<FieldError>,
}

impl ValidationFailure {
    /// First message reported for `field`
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for ValidationFailure {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid {}", field)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        ValidationFailure { fields }
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.into())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from reqwest::Error
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            AppError::transport(format!("connection failed: {}", err))
        } else if err.is_decode() {
            AppError::transport(format!("invalid response body: {}", err))
        } else {
            AppError::transport(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
