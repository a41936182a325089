//! Probe definitions file.
//!
//! A TOML document with one `[[probe]]` table per probe:
//!
//! ```toml
//! [[probe]]
//! name = "ows-capabilities"
//! base_url = "http://svc/ows"
//! template = "?service=WMS&request={op}"
//! parameters = { op = "GetCapabilities" }
//!
//! [[probe.checks]]
//! checker = "status-is-200"
//! ```

use std::{fs, io, path};

use probe_engine::{ProbeDefinition, ProbeRunner, template};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionsError {
    #[error("failed to read definitions {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: io::Error },

    #[error("failed to parse definitions: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("definitions file contains no [[probe]] entries")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct DefinitionsFile {
    #[serde(default, rename = "probe")]
    probes: Vec<ProbeDefinition>,
}

pub fn parse_definitions(raw: &str) -> Result<Vec<ProbeDefinition>, DefinitionsError> {
    let file: DefinitionsFile = toml::from_str(raw)?;
    if file.probes.is_empty() {
        return Err(DefinitionsError::Empty);
    }
    Ok(file.probes)
}

pub fn load_definitions(path: &path::Path) -> Result<Vec<ProbeDefinition>, DefinitionsError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| DefinitionsError::ReadFailed { path: path.to_path_buf(), source })?;
    parse_definitions(&raw)
}

/// Problems that would make a probe fail before or regardless of its request
pub fn lint(runner: &ProbeRunner, definition: &ProbeDefinition) -> Vec<String> {
    let mut problems = Vec::new();

    if let Err(error) = runner.prepare(definition) {
        problems.push(error.to_string());
    }

    if let Some(template) = &definition.template {
        if let Ok(names) = template::placeholders(template) {
            problems.extend(
                definition
                    .parameters
                    .keys()
                    .filter(|key| !names.contains(key))
                    .map(|key| format!("parameter '{key}' is not used by the template")),
            );
        }
    }

    problems.extend(
        definition
            .checks
            .iter()
            .filter(|check| !runner.registry().contains(&check.checker))
            .map(|check| format!("unknown checker '{}'", check.checker)),
    );

    problems
}

#[cfg(test)]
mod tests {
    use probe_engine::RunnerConfig;
    use tempfile::tempdir;

    use super::*;

    const EXAMPLE: &str = r#"
        [[probe]]
        name = "ows-capabilities"
        base_url = "http://svc/ows"
        template = "?service=WMS&request={op}"
        parameters = { op = "GetCapabilities" }

        [[probe.checks]]
        checker = "status-is-200"

        [[probe.checks]]
        checker = "not-contains-ows-exception"

        [[probe]]
        base_url = "http://svc/csw"
        method = "POST"
        template = "<GetRecords/>"
        timeout_secs = 5
        headers = { Content-Type = "application/xml" }
    "#;

    fn runner() -> ProbeRunner {
        ProbeRunner::http(RunnerConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_definitions() {
        let probes = parse_definitions(EXAMPLE).unwrap();

        assert_eq!(probes.len(), 2);
        assert_eq!(probes[0].label(), "ows-capabilities");
        assert_eq!(probes[0].checks.len(), 2);
        assert_eq!(probes[1].method, "POST");
        assert_eq!(probes[1].timeout_secs, Some(5));
        assert_eq!(probes[1].headers["Content-Type"], "application/xml");
    }

    #[test]
    fn test_empty_file_is_rejected() {
        assert!(matches!(parse_definitions(""), Err(DefinitionsError::Empty)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("probes.toml");
        fs::write(&path, EXAMPLE).unwrap();

        assert_eq!(load_definitions(&path).unwrap().len(), 2);
        assert!(matches!(
            load_definitions(&dir.path().join("missing.toml")),
            Err(DefinitionsError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_lint_clean_definitions() {
        let runner = runner();
        for definition in parse_definitions(EXAMPLE).unwrap() {
            assert!(lint(&runner, &definition).is_empty(), "{definition:?}");
        }
    }

    #[test]
    fn test_lint_reports_problems() {
        let definition = ProbeDefinition::new("http://svc/ows")
            .with_method("HEAD")
            .with_template("?request={op}")
            .with_parameter("op", "GetMap")
            .with_parameter("unused", "x")
            .with_check(probe_engine::CheckSpec::new("xml-parse"));

        let problems = lint(&runner(), &definition);

        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("HEAD"));
        assert!(problems[1].contains("unused"));
        assert!(problems[2].contains("xml-parse"));
    }
}
