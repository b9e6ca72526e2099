use std::fmt;

use thiserror::Error;

use crate::http_client::Response;

/// Main client error type that encompasses all possible failure modes of an
/// exchange-and-assert chain
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {uri} - {details}")]
    Transport { uri: String, details: String },

    #[error("Malformed content: {details}")]
    MalformedContent { details: String },

    #[error("Invalid query '{query}': {details}")]
    Query { query: String, details: String },

    #[error("Assertion failed: {0}")]
    Assertion(AssertionFailure),

    #[error("No Location header in response from {uri}")]
    NoRedirect { uri: String },

    #[error("Link not found by '{query}' in response from {uri}")]
    LinkNotFound { query: String, uri: String },

    #[error(
        "Retry exhausted: '{query}' not matched after {attempts} attempts (last status {})",
        last.status
    )]
    RetryExhausted {
        query: String,
        attempts: u32,
        last: Box<Response>,
    },

    #[error("Invalid URI: {uri} - {details}")]
    InvalidUri { uri: String, details: String },
}

/// An expected condition that did not hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionFailure {
    pub reason: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl AssertionFailure {
    /// Failure reported explicitly by calling code
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            expected: None,
            actual: None,
        }
    }

    /// Mismatch between an expected and an observed value
    pub fn mismatch(
        reason: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self {
            reason: reason.into(),
            expected: Some(expected.to_string()),
            actual: Some(actual.to_string()),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)?;
        match (&self.expected, &self.actual) {
            (Some(expected), Some(actual)) => {
                write!(f, " (expected {}, actual {})", expected, actual)
            }
            (Some(expected), None) => write!(f, " (expected {})", expected),
            (None, Some(actual)) => write!(f, " (actual {})", actual),
            (None, None) => Ok(()),
        }
    }
}

impl From<AssertionFailure> for ClientError {
    fn from(failure: AssertionFailure) -> Self {
        ClientError::Assertion(failure)
    }
}

impl ClientError {
    /// Build a transport error for the given target
    pub fn transport(uri: impl ToString, details: impl ToString) -> Self {
        ClientError::Transport {
            uri: uri.to_string(),
            details: details.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, ClientError::Assertion(_))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ClientError>;
