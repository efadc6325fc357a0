//! Failures raised while serving a request, and the payload that reports them.
//!
//! Handlers never let a `ServiceError` escape to the Lambda runtime. Each one
//! is flattened into an [`ErrorInfo`] record at the handler boundary, which
//! is what the caller actually sees.

use lambda_runtime::tracing::error;
use serde::Serialize;
use thiserror::Error;

/// Status reported when a failure carries no explicit code of its own.
pub const UNKNOWN_STATUS: u16 = 800;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{status_text}")]
    Upstream { status: u16, status_text: String },

    #[error("{message}")]
    Validation {
        helper: &'static str,
        message: String,
        status_code: u16,
    },

    #[error("failed to reach the statistics API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse the statistics API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Unknown(String),
}

impl ServiceError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn upstream(status: u16, status_text: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            status_text: status_text.into(),
        }
    }

    /// Re-signal a failure raised inside a validation helper, keeping its
    /// status code when it has one.
    pub fn validation(helper: &'static str, inner: ServiceError) -> Self {
        let status_code = inner.status_code();
        Self::Validation {
            helper,
            message: inner.to_string(),
            status_code,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } => 400,
            Self::Upstream { status, .. } => *status,
            Self::Validation { status_code, .. } => *status_code,
            Self::Transport(_) | Self::Decode(_) | Self::Unknown(_) => UNKNOWN_STATUS,
        }
    }

    pub fn description(&self) -> Option<String> {
        match self {
            Self::InvalidInput { .. } => Some("invalid input".to_owned()),
            Self::Upstream { .. } => Some("API response error".to_owned()),
            Self::Validation { helper, .. } => Some(format!("{helper} error")),
            Self::Transport(_) | Self::Decode(_) | Self::Unknown(_) => None,
        }
    }

    /// Flatten into the caller-facing payload, logging it on the way out.
    pub fn into_logged_info(self) -> ErrorInfo {
        let info = ErrorInfo::from(&self);
        error!(error = %info.message, status_code = info.status_code, "request failed");
        info
    }
}

/// The uniform failure payload returned in place of a result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub description: Option<String>,
    pub message: String,
    pub status_code: u16,
}

impl From<&ServiceError> for ErrorInfo {
    fn from(err: &ServiceError) -> Self {
        ErrorInfo {
            description: err.description(),
            message: err.to_string(),
            status_code: err.status_code(),
        }
    }
}

impl From<ServiceError> for ErrorInfo {
    fn from(err: ServiceError) -> Self {
        ErrorInfo::from(&err)
    }
}
