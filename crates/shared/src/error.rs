use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Transport,
    Unauthorized,
    RateLimited,
    UpstreamStatus,
    MalformedResponse,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct SearchError {
    pub code: ErrorCode,
    pub message: String,
}

impl SearchError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedResponse, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Maps a non-success HTTP status onto the error taxonomy.
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let code = match status {
            401 | 403 => ErrorCode::Unauthorized,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::UpstreamStatus,
        };
        let message = if detail.is_empty() {
            format!("image service returned HTTP {status}")
        } else {
            format!("image service returned HTTP {status}: {detail}")
        };
        Self::new(code, message)
    }

    /// Short text suitable for an error banner.
    pub fn user_message(&self) -> &'static str {
        match self.code {
            ErrorCode::Transport => {
                "Could not reach the image service. Check your connection and try again."
            }
            ErrorCode::Unauthorized => {
                "The image service rejected the access key. Check your configuration."
            }
            ErrorCode::RateLimited => {
                "Too many requests to the image service. Wait a moment and try again."
            }
            ErrorCode::Validation => "The search could not be sent. Check your configuration.",
            ErrorCode::UpstreamStatus | ErrorCode::MalformedResponse => GENERIC_FAILURE_MESSAGE,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Transport
                | ErrorCode::RateLimited
                | ErrorCode::UpstreamStatus
                | ErrorCode::MalformedResponse
        )
    }
}
