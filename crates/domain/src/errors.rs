//! Error types used throughout the client crates
//!
//! Every failure a caller can observe is an [`ApiError`]. The variants keep the
//! origin of the failure (precondition, transport, backend-reported) while
//! [`ApiError::status_code`] and [`ApiError::message`] give the flat
//! `{ message, statusCode }` shape all three backends are normalized into.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name carried by every error produced by the clients.
pub const API_ERROR_NAME: &str = "ClassevivaApiError";

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorCategory {
    /// Detected before any I/O (already logged in, bad argument, ...)
    Precondition,
    /// Non-2xx status or unparsable body
    Transport,
    /// Failure embedded in an otherwise successful response
    Business,
    /// Connection-level failure, no status available
    Network,
    /// Invalid client configuration
    Config,
}

/// Main error type for the session clients
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApiError {
    #[error("{message}")]
    Precondition { message: String },

    #[error("{message} ({status})")]
    Transport { status: u16, message: String },

    #[error("{message} ({status})")]
    Business { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ApiError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition { message: message.into() }
    }

    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Self::Transport { status, message: message.into() }
    }

    pub fn business(status: u16, message: impl Into<String>) -> Self {
        Self::Business { status, message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Status code attached to the error, `0` when it is not transport derived.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transport { status, .. } | Self::Business { status, .. } => *status,
            Self::Precondition { .. } | Self::Network { .. } | Self::Config { .. } => 0,
        }
    }

    /// Human readable message without the status suffix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Precondition { message }
            | Self::Transport { message, .. }
            | Self::Business { message, .. }
            | Self::Network { message }
            | Self::Config { message } => message,
        }
    }

    /// Constant error name shared by every variant.
    #[must_use]
    pub fn name(&self) -> &'static str {
        API_ERROR_NAME
    }

    #[must_use]
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Precondition { .. } => ApiErrorCategory::Precondition,
            Self::Transport { .. } => ApiErrorCategory::Transport,
            Self::Business { .. } => ApiErrorCategory::Business,
            Self::Network { .. } => ApiErrorCategory::Network,
            Self::Config { .. } => ApiErrorCategory::Config,
        }
    }

    /// True when the backend rejected the credentials or the session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), 401 | 403)
    }
}

/// Result type alias for client operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;
