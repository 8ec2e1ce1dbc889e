//! Error types for the ServiceNow client.
//!
//! This module defines `NowError`, the unified error type returned by every
//! client operation, and `ContextError`, the reason a [`Context`] ended.
//!
//! # Security
//!
//! Error values never carry credentials. Transport errors have the
//! `client_secret` query parameter redacted from their URL before they reach
//! the caller. Error bodies returned by the server are truncated.
//!
//! [`Context`]: crate::context::Context

use reqwest::StatusCode;
use thiserror::Error;

/// Why a [`Context`](crate::context::Context) stopped accepting work.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context was cancelled through its `Canceller`.
    #[error("context cancelled")]
    Cancelled,

    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Unified error type for all ServiceNow client operations.
#[derive(Error, Debug)]
pub enum NowError {
    /// A required identifier was empty. Raised before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// A URL, query string or request body could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The client or its environment is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller's context was cancelled or its deadline passed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The request failed on the network.
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The request body is a stream and cannot be copied for re-sending.
    #[error("request body is a stream and cannot be copied")]
    StreamingBody,

    /// The server rejected the credentials (HTTP 401/403).
    #[error("authentication failed - check SERVICENOW_USERNAME and SERVICENOW_PASSWORD")]
    Authentication,

    /// The server returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: StatusCode,
        /// The response body, truncated.
        body: String,
    },

    /// The response body was not valid JSON for the expected shape.
    #[error("failed to decode response (HTTP {status}): {source}")]
    Decode {
        /// Status of the response whose body failed to decode.
        status: StatusCode,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Copying a raw response body into the caller's writer failed.
    #[error("failed to write response body: {0}")]
    Sink(#[source] std::io::Error),
}

impl NowError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        NowError::Validation(message.into())
    }

    /// Creates an encoding error.
    pub fn encoding(message: impl ToString) -> Self {
        NowError::Encoding(message.to_string())
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        NowError::Configuration(message.into())
    }

    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        NowError::Configuration(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a validation error for an empty record identifier.
    pub fn empty_identifier(kind: &str, field: &str) -> Self {
        NowError::Validation(format!("{} {} cannot be empty", kind, field))
    }

    /// Returns the context error if this error came from a cancelled or expired context.
    #[must_use]
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            NowError::Context(e) => Some(*e),
            _ => None,
        }
    }

    /// Redacts `client_secret` from the URL carried by a transport error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn sanitized(self) -> Self {
        match self {
            NowError::Transport(mut e) => {
                if let Some(url) = e.url_mut() {
                    crate::client::redact_client_secret(url);
                }
                NowError::Transport(e)
            }
            other => other,
        }
    }
}
