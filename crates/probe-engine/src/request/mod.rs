//! Request construction.
//!
//! Turns a [`ProbeDefinition`] into a concrete [`ProbeRequest`]: the template
//! is resolved against the probe parameters and either appended to the base
//! address (GET) or used as the body (POST).

mod validation;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use validation::validate_request;

use crate::definition::ProbeDefinition;
use crate::error::ProbeError;
use crate::template;

/// HTTP methods a probe may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

impl FromStr for Method {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(ProbeError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// A fully resolved outbound request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub method: Method,

    pub url: String,

    /// Resolved template for POST requests
    pub body: Option<String>,

    /// Headers in the order they are sent, which is sorted by name
    pub headers: Vec<(String, String)>,
}

/// Builds [`ProbeRequest`]s from probe definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder;

impl RequestBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `definition` into a request. Fails before any I/O on an
    /// unsupported method, an unresolvable template or a request that does not
    /// pass validation.
    pub fn build(&self, definition: &ProbeDefinition) -> Result<ProbeRequest, ProbeError> {
        let method: Method = definition.method.parse()?;

        let request_string = definition
            .template
            .as_deref()
            .map(|template| template::resolve(template, &definition.parameters))
            .transpose()?;

        let (url, body) = match method {
            Method::Get => match request_string {
                Some(query) => (format!("{}{}", definition.base_url, query), None),
                None => (definition.base_url.clone(), None),
            },
            Method::Post => (definition.base_url.clone(), request_string),
        };

        let headers = definition
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let request = ProbeRequest { method, url, body, headers };
        validate_request(&request)?;

        debug!(method = %request.method, url = %request.url, "Built probe request");
        Ok(request)
    }
}
