//! Backend-to-UI events and error modeling for the gallery controller.

use shared::{
    domain::{ImageId, SearchResult},
    error::{ErrorCode, SearchError},
};

use crate::media::{ImagePurpose, PreviewImage};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    SearchSettled {
        seq: u64,
        outcome: Result<SearchResult, SearchError>,
    },
    ImageLoaded {
        image_id: ImageId,
        purpose: ImagePurpose,
        image: PreviewImage,
    },
    ImageFailed {
        image_id: ImageId,
        purpose: ImagePurpose,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    RateLimited,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Search,
    LoadMore,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Auth => "Authentication",
        UiErrorCategory::Transport => "Network",
        UiErrorCategory::RateLimited => "Rate limit",
        UiErrorCategory::Validation => "Configuration",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_search_error(context: UiErrorContext, err: &SearchError) -> Self {
        let category = match err.code {
            ErrorCode::Unauthorized => UiErrorCategory::Auth,
            ErrorCode::Transport => UiErrorCategory::Transport,
            ErrorCode::RateLimited => UiErrorCategory::RateLimited,
            ErrorCode::Validation => UiErrorCategory::Validation,
            ErrorCode::UpstreamStatus | ErrorCode::MalformedResponse => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.user_message().to_string(),
        }
    }

    /// Classifies free-form failures that never went through the search client.
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("access key")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("429") || message_lower.contains("rate limit") {
            UiErrorCategory::RateLimited
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Errors that will repeat until the settings change; retrying is pointless.
    pub fn requires_reconfigure(&self) -> bool {
        matches!(
            self.category,
            UiErrorCategory::Auth | UiErrorCategory::Validation
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
