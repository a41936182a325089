//! Request validation.
//!
//! Limits applied to every built request before it reaches the transport.

use url::Url;

use super::ProbeRequest;
use crate::error::ProbeError;

const MAX_HEADERS: usize = 20;
const MAX_HEADER_SIZE: usize = 8192;
const MAX_BODY_SIZE: usize = 1024 * 1024; // 1MB

/// Validate a built probe request
pub fn validate_request(request: &ProbeRequest) -> Result<(), ProbeError> {
    validate_url(&request.url)?;
    validate_headers(&request.headers)?;

    if let Some(body) = &request.body {
        validate_body_size(body)?;
    }

    Ok(())
}

/// Validate URL format and scheme
fn validate_url(url: &str) -> Result<(), ProbeError> {
    let parsed = Url::parse(url)
        .map_err(|e| ProbeError::InvalidRequest(format!("invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ProbeError::InvalidRequest(format!("unsupported URL scheme: {other}"))),
    }
}

fn validate_headers(headers: &[(String, String)]) -> Result<(), ProbeError> {
    if headers.len() > MAX_HEADERS {
        return Err(ProbeError::InvalidRequest(format!(
            "too many headers: {} (max: {MAX_HEADERS})",
            headers.len()
        )));
    }

    for (key, value) in headers {
        if key.trim().is_empty() {
            return Err(ProbeError::InvalidRequest("empty header name".to_string()));
        }
        if key.len() + value.len() > MAX_HEADER_SIZE {
            return Err(ProbeError::InvalidRequest(format!(
                "header '{key}' too large: {} bytes (max: {MAX_HEADER_SIZE} bytes)",
                key.len() + value.len()
            )));
        }
    }

    Ok(())
}

fn validate_body_size(body: &str) -> Result<(), ProbeError> {
    if body.len() > MAX_BODY_SIZE {
        return Err(ProbeError::InvalidRequest(format!(
            "body too large: {} bytes (max: {MAX_BODY_SIZE} bytes)",
            body.len()
        )));
    }

    Ok(())
}
