//! Pluggable response checks.
//!
//! A [`Checker`] inspects the response of a probe run and produces a
//! [`Verdict`]. Checkers are created per run from a [`CheckerRegistry`] by
//! their string identifier, so the set of checks stays open.

mod content;
mod headers;
mod isolation;
mod registry;
mod status;
mod timing;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use content::{ContainsStrings, JsonParse, NotContainsOwsException, NotContainsStrings};
pub use headers::{HasContentType, HasHeaderValue, HasImageContentType};
pub use isolation::{dispatch, isolate};
pub use registry::{CheckerFactory, CheckerRegistry};
pub use status::{StatusIn, StatusIs200, StatusNoError};
pub use timing::ResponseTimeUnder;

use crate::definition::ProbeDefinition;
use crate::error::CheckError;
use crate::request::ProbeRequest;
use crate::transport::Response;

/// Parameters of a check, as configured
pub type Parameters = serde_json::Map<String, Value>;

/// Everything a checker may look at during evaluation
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub probe: &'a ProbeDefinition,
    pub request: &'a ProbeRequest,
    pub response: &'a Response,
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub success: bool,
    pub message: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }

    /// Pass or fail depending on `success`, with the same message either way
    pub fn from_bool(success: bool, message: impl Into<String>) -> Self {
        Self { success, message: message.into() }
    }
}

/// A single kind of assertion against a response.
///
/// Instances are created fresh for every run and evaluated once. Evaluation
/// is expected to be pure computation over the context.
pub trait Checker: Send {
    /// Bind the configured parameters. Called exactly once, before `evaluate`.
    fn initialize(&mut self, parameters: &Parameters) -> Result<(), CheckError>;

    /// Inspect the response.
    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError>;
}

/// Deserialize check parameters into a typed struct.
pub fn parse_parameters<T: DeserializeOwned>(parameters: &Parameters) -> Result<T, CheckError> {
    serde_json::from_value(Value::Object(parameters.clone()))
        .map_err(|e| CheckError::InvalidParameters(e.to_string()))
}
