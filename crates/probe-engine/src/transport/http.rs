//! reqwest backed transport.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use super::{Response, Transport};
use crate::error::TransportError;
use crate::request::{Method, ProbeRequest};

/// Default user agent sent by [`HttpTransport`]
pub const USER_AGENT: &str = concat!("probe-engine/", env!("CARGO_PKG_VERSION"));

/// HTTP transport over a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport whose client gives up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Self::with_user_agent(timeout, USER_AGENT)
    }

    pub fn with_user_agent(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::from(err)
        }
    }
}

/// Every header, values that are not valid UTF-8 decoded lossily
fn capture_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ProbeRequest) -> Result<Response, TransportError> {
        let mut http_request = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            http_request = http_request.header(name, value);
        }

        if let Some(body) = &request.body {
            http_request = http_request.body(body.clone());
        }

        let start = Instant::now();
        let response = http_request.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = capture_headers(response.headers());

        let body = response.bytes().await.map_err(|e| self.map_error(e))?.to_vec();
        let elapsed = start.elapsed();

        debug!(status, bytes = body.len(), elapsed_ms = elapsed.as_millis() as u64, "Received response");

        Ok(Response { status, headers, body, elapsed })
    }
}
