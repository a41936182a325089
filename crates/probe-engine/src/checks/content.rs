//! Response body checks.

use serde::Deserialize;

use super::{CheckContext, Checker, Parameters, Verdict, parse_parameters};
use crate::error::CheckError;

const OWS_EXCEPTION_MARKERS: [&str; 2] = ["ExceptionReport", "ServiceException"];

#[derive(Debug, Deserialize)]
struct StringsParams {
    strings: Vec<String>,
}

fn parse_strings(parameters: &Parameters) -> Result<Vec<String>, CheckError> {
    let params: StringsParams = parse_parameters(parameters)?;
    if params.strings.is_empty() {
        return Err(CheckError::InvalidParameters("strings must not be empty".to_string()));
    }
    Ok(params.strings)
}

/// Passes when the body contains every configured string.
#[derive(Debug, Default)]
pub struct ContainsStrings {
    strings: Vec<String>,
}

impl Checker for ContainsStrings {
    fn initialize(&mut self, parameters: &Parameters) -> Result<(), CheckError> {
        self.strings = parse_strings(parameters)?;
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let body = context.response.text();
        let missing: Vec<&str> =
            self.strings.iter().map(String::as_str).filter(|s| !body.contains(s)).collect();

        if missing.is_empty() {
            Ok(Verdict::pass(format!("found all of {:?}", self.strings)))
        } else {
            Ok(Verdict::fail(format!("missing {missing:?}")))
        }
    }
}

/// Passes when the body contains none of the configured strings.
#[derive(Debug, Default)]
pub struct NotContainsStrings {
    strings: Vec<String>,
}

impl Checker for NotContainsStrings {
    fn initialize(&mut self, parameters: &Parameters) -> Result<(), CheckError> {
        self.strings = parse_strings(parameters)?;
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let body = context.response.text();
        let found: Vec<&str> =
            self.strings.iter().map(String::as_str).filter(|s| body.contains(s)).collect();

        if found.is_empty() {
            Ok(Verdict::pass(format!("none of {:?} found", self.strings)))
        } else {
            Ok(Verdict::fail(format!("found {found:?}")))
        }
    }
}

/// Fails when the body is an OGC service exception document.
#[derive(Debug, Default)]
pub struct NotContainsOwsException;

impl Checker for NotContainsOwsException {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let body = context.response.text();
        match OWS_EXCEPTION_MARKERS.iter().find(|marker| body.contains(*marker)) {
            Some(marker) => Ok(Verdict::fail(format!("response contains {marker}"))),
            None => Ok(Verdict::pass("no OWS exception")),
        }
    }
}

/// Passes when the body is well-formed JSON.
#[derive(Debug, Default)]
pub struct JsonParse;

impl Checker for JsonParse {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        match serde_json::from_slice::<serde_json::Value>(&context.response.body) {
            Ok(_) => Ok(Verdict::pass("valid JSON")),
            Err(e) => Ok(Verdict::fail(format!("invalid JSON: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::checks::test_support::evaluate_with;
    use crate::transport::Response;

    fn capabilities() -> Response {
        Response::new(200).with_body("<WMS_Capabilities version=\"1.3.0\"><Service/></WMS_Capabilities>")
    }

    #[test]
    fn test_contains_strings() {
        let all = json!({ "strings": ["WMS_Capabilities", "<Service"] });
        assert!(evaluate_with(&mut ContainsStrings::default(), all, &capabilities()).unwrap().success);

        let partial = json!({ "strings": ["WMS_Capabilities", "<Layer"] });
        let verdict = evaluate_with(&mut ContainsStrings::default(), partial, &capabilities()).unwrap();
        assert!(!verdict.success);
        assert!(verdict.message.contains("<Layer"));
    }

    #[test]
    fn test_not_contains_strings() {
        let params = json!({ "strings": ["error", "<Layer"] });
        assert!(evaluate_with(&mut NotContainsStrings::default(), params, &capabilities()).unwrap().success);

        let params = json!({ "strings": ["<Service"] });
        assert!(!evaluate_with(&mut NotContainsStrings::default(), params, &capabilities()).unwrap().success);
    }

    #[test]
    fn test_strings_parameter_is_required() {
        let err = evaluate_with(&mut ContainsStrings::default(), Value::Null, &capabilities()).unwrap_err();
        assert!(matches!(err, CheckError::InvalidParameters(_)));

        let err = evaluate_with(&mut NotContainsStrings::default(), json!({ "strings": [] }), &capabilities())
            .unwrap_err();
        assert!(matches!(err, CheckError::InvalidParameters(_)));
    }

    #[test]
    fn test_not_contains_ows_exception() {
        assert!(evaluate_with(&mut NotContainsOwsException, Value::Null, &capabilities()).unwrap().success);

        let exception = Response::new(200)
            .with_body("<ows:ExceptionReport><ows:Exception exceptionCode=\"InvalidParameterValue\"/></ows:ExceptionReport>");
        let verdict = evaluate_with(&mut NotContainsOwsException, Value::Null, &exception).unwrap();
        assert!(!verdict.success);
        assert!(verdict.message.contains("ExceptionReport"));
    }

    #[test]
    fn test_json_parse() {
        let valid = Response::new(200).with_body(r#"{"type": "FeatureCollection", "features": []}"#);
        assert!(evaluate_with(&mut JsonParse, Value::Null, &valid).unwrap().success);

        let invalid = Response::new(200).with_body("<html>");
        assert!(!evaluate_with(&mut JsonParse, Value::Null, &invalid).unwrap().success);
    }
}
