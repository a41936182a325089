//! Status code checks.

use serde::Deserialize;

use super::{CheckContext, Checker, Parameters, Verdict, parse_parameters};
use crate::error::CheckError;

/// Passes on exactly 200. The message is the status code.
#[derive(Debug, Default)]
pub struct StatusIs200;

impl Checker for StatusIs200 {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let status = context.response.status;
        if status == 200 {
            Ok(Verdict::pass(status.to_string()))
        } else {
            Ok(Verdict::fail(format!("{status} (expected 200)")))
        }
    }
}

/// Fails on any 4xx or 5xx status.
#[derive(Debug, Default)]
pub struct StatusNoError;

impl Checker for StatusNoError {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let response = context.response;
        if response.is_error_status() {
            Ok(Verdict::fail(format!("HTTP error status {}", response.status)))
        } else {
            Ok(Verdict::pass(format!("HTTP status {}", response.status)))
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusInParams {
    codes: Vec<u16>,
}

/// Passes when the status is one of the configured `codes`.
#[derive(Debug, Default)]
pub struct StatusIn {
    codes: Vec<u16>,
}

impl Checker for StatusIn {
    fn initialize(&mut self, parameters: &Parameters) -> Result<(), CheckError> {
        let params: StatusInParams = parse_parameters(parameters)?;
        if params.codes.is_empty() {
            return Err(CheckError::InvalidParameters("codes must not be empty".to_string()));
        }
        self.codes = params.codes;
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let status = context.response.status;
        Ok(Verdict::from_bool(
            self.codes.contains(&status),
            format!("status {status}, expected one of {:?}", self.codes),
        ))
    }
}
