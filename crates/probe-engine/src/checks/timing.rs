use std::time::Duration;

use serde::Deserialize;

use super::{CheckContext, Checker, Parameters, Verdict, parse_parameters};
use crate::error::CheckError;

#[derive(Debug, Deserialize)]
struct ResponseTimeParams {
    max_ms: u64,
}

/// Passes when the response arrived within `max_ms` milliseconds.
#[derive(Debug, Default)]
pub struct ResponseTimeUnder {
    max: Duration,
}

impl Checker for ResponseTimeUnder {
    fn initialize(&mut self, parameters: &Parameters) -> Result<(), CheckError> {
        let params: ResponseTimeParams = parse_parameters(parameters)?;
        self.max = Duration::from_millis(params.max_ms);
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let elapsed = context.response.elapsed;
        Ok(Verdict::from_bool(
            elapsed <= self.max,
            format!("responded in {} ms (limit {} ms)", elapsed.as_millis(), self.max.as_millis()),
        ))
    }
}
