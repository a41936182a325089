//! Response header checks.

use serde::Deserialize;

use super::{CheckContext, Checker, Parameters, Verdict, parse_parameters};
use crate::error::CheckError;

/// Media type without parameters such as `; charset=utf-8`
fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

#[derive(Debug, Deserialize)]
struct HeaderValueParams {
    header_name: String,
    header_value: String,
}

/// Passes when `header_name` is present with exactly `header_value`.
#[derive(Debug, Default)]
pub struct HasHeaderValue {
    name: String,
    value: String,
}

impl Checker for HasHeaderValue {
    fn initialize(&mut self, parameters: &Parameters) -> Result<(), CheckError> {
        let params: HeaderValueParams = parse_parameters(parameters)?;
        self.name = params.header_name;
        self.value = params.header_value;
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        match context.response.header(&self.name) {
            Some(value) if value == self.value => Ok(Verdict::pass(format!("{}: {value}", self.name))),
            Some(value) => Ok(Verdict::fail(format!(
                "{} is '{value}', expected '{}'",
                self.name, self.value
            ))),
            None => Ok(Verdict::fail(format!("header {} not present", self.name))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentTypeParams {
    header_value: String,
}

/// Passes when the Content-Type media type equals `header_value`.
#[derive(Debug, Default)]
pub struct HasContentType {
    expected: String,
}

impl Checker for HasContentType {
    fn initialize(&mut self, parameters: &Parameters) -> Result<(), CheckError> {
        let params: ContentTypeParams = parse_parameters(parameters)?;
        self.expected = params.header_value;
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let Some(content_type) = context.response.header("content-type") else {
            return Ok(Verdict::fail("no Content-Type header"));
        };

        let actual = media_type(content_type);
        Ok(Verdict::from_bool(
            actual.eq_ignore_ascii_case(media_type(&self.expected)),
            format!("Content-Type {actual}, expected {}", self.expected),
        ))
    }
}

/// Passes when the Content-Type is an `image/*` type.
#[derive(Debug, Default)]
pub struct HasImageContentType;

impl Checker for HasImageContentType {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let content_type = context.response.header("content-type").unwrap_or_default();
        let actual = media_type(content_type);
        Ok(Verdict::from_bool(
            actual.to_ascii_lowercase().starts_with("image/"),
            format!("Content-Type '{actual}'"),
        ))
    }
}
