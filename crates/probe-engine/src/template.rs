//! Request template substitution.
//!
//! Placeholder syntax:
//!
//! - `{name}` is replaced by the parameter `name`. Names are non-empty and may
//!   not contain braces.
//! - `{{` and `}}` produce a literal `{` and `}`.
//!
//! Strings are inserted verbatim, numbers and booleans in their display form,
//! and flat lists of scalars are joined with `,` (e.g. OWS layer lists). A
//! missing parameter or a malformed template is always an error; a partially
//! substituted string is never returned.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::TemplateError;

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal runs and placeholder names.
fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                segments.push(Segment::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                segments.push(Segment::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                segments.push(Segment::Literal(&template[literal_start..i]));
                let open = i;
                let close = template[open + 1..]
                    .find(['{', '}'])
                    .map(|offset| open + 1 + offset)
                    .filter(|&pos| bytes[pos] == b'}')
                    .ok_or(TemplateError::Unclosed(open))?;
                let name = &template[open + 1..close];
                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder(open));
                }
                segments.push(Segment::Placeholder(name));
                i = close + 1;
                literal_start = i;
            }
            b'}' => return Err(TemplateError::UnmatchedClose(i)),
            _ => i += 1,
        }
    }
    segments.push(Segment::Literal(&template[literal_start..]));

    Ok(segments)
}

fn render_value(name: &str, value: &Value) -> Result<String, TemplateError> {
    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar)
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(","))
            .ok_or_else(|| TemplateError::UnsupportedValue(name.to_string())),
        other => scalar(other).ok_or_else(|| TemplateError::UnsupportedValue(name.to_string())),
    }
}

/// Substitute every placeholder in `template` with its parameter.
pub fn resolve(template: &str, parameters: &BTreeMap<String, Value>) -> Result<String, TemplateError> {
    let mut resolved = String::with_capacity(template.len());

    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => resolved.push_str(text),
            Segment::Placeholder(name) => {
                let value = parameters
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingParameter(name.to_string()))?;
                resolved.push_str(&render_value(name, value)?);
            }
        }
    }

    Ok(resolved)
}

/// Placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names: Vec<String> = Vec::new();
    for segment in parse(template)? {
        if let Segment::Placeholder(name) = segment {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
