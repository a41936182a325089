//! The network boundary.
//!
//! The engine never talks to the network directly; it hands a built
//! [`ProbeRequest`] to a [`Transport`] and receives a [`Response`] snapshot.

mod http;

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;

pub use http::{HttpTransport, USER_AGENT};

use crate::error::TransportError;
use crate::request::ProbeRequest;

/// Performs the actual network exchange for a probe run.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the complete response.
    ///
    /// Non-2xx statuses are responses, not errors. Only failures to obtain a
    /// response at all are reported as [`TransportError`].
    async fn send(&self, request: &ProbeRequest) -> Result<Response, TransportError>;
}

/// Immutable snapshot of one HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,

    /// Header names are stored lower-case
    pub headers: Vec<(String, String)>,

    pub body: Vec<u8>,

    /// Wall-clock time from sending the request to reading the full body
    pub elapsed: Duration,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new(), body: Vec::new(), elapsed: Duration::ZERO }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.push((name.as_ref().to_ascii_lowercase(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// First value of the header `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body decoded as UTF-8, invalid sequences replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// 4xx or 5xx
    pub fn is_error_status(&self) -> bool {
        matches!(self.status / 100, 4 | 5)
    }
}
