//! Error types for the probe engine.
//!
//! Only [`ProbeError`] escapes a run as an `Err`. Transport failures end up in
//! the [`ProbeResult`](crate::ProbeResult) as an aborted outcome, and
//! [`CheckError`]s are folded into failing check results.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while resolving a request template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing template parameter '{0}'")]
    MissingParameter(String),

    #[error("unclosed placeholder starting at byte {0}")]
    Unclosed(usize),

    #[error("unmatched '}}' at byte {0}")]
    UnmatchedClose(usize),

    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("parameter '{0}' cannot be rendered into a template (only scalars and flat lists are)")]
    UnsupportedValue(String),
}

/// Configuration errors detected before any network call is made.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("unsupported HTTP method: {0} (only GET and POST are supported)")]
    UnsupportedMethod(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Network level failures reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured duration on the error
            TransportError::Request(format!("timeout: {err}"))
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else if err.is_builder() {
            TransportError::Client(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Failures of a single check. Always recovered into a failing check result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("no checker registered as '{0}'")]
    UnknownChecker(String),

    #[error("checker could not be constructed: {0}")]
    Construction(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("checker panicked: {0}")]
    Panicked(String),
}
