use crate::config::ProviderKey;
use std::io;
use thiserror::Error;

/// Failures of a single dispatch, normalized across vendors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No adapter is registered for the requested provider
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Timeout, refused connection or non-2xx status
    #[error("transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The vendor answered, but not in the shape its adapter expects
    #[error("malformed response from {provider}: {detail}")]
    MalformedResponse {
        provider: ProviderKey,
        detail: String,
    },
}

impl DispatchError {
    pub fn malformed(provider: ProviderKey, detail: impl Into<String>) -> Self {
        DispatchError::MalformedResponse {
            provider,
            detail: detail.into(),
        }
    }

    /// Whether resubmitting the same message could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Transport { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let err = err.without_url();
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else if err.is_status() {
            format!("backend returned error status: {}", err)
        } else {
            format!("request failed: {}", err)
        };
        DispatchError::Transport { status, message }
    }
}

/// Unified error type for the prat library
#[derive(Error, Debug)]
pub enum PratError {
    /// User input rejected before dispatch
    #[error("validation error: {0}")]
    Validation(String),

    /// A submit arrived while the previous one is still in flight
    #[error("a message is already pending")]
    AlreadyPending,

    /// The conversation was reset while this reply was in flight
    #[error("conversation was reset before the reply arrived")]
    Superseded,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PratError {
    fn from(err: serde_json::Error) -> Self {
        PratError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for PratError {
    fn from(err: serde_yml::Error) -> Self {
        PratError::Serialization(format!("YAML error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PratError>;
