//! Declarative probe definitions.
//!
//! Definitions are owned by whoever persists them (a config file, a database);
//! the engine only reads them for the duration of one run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::Parameters;

/// One configured unit of monitoring work: a resource, a request recipe and a
/// list of checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeDefinition {
    /// Display name used in logs and results
    #[serde(default)]
    pub name: Option<String>,

    /// Base address of the monitored resource
    pub base_url: String,

    /// HTTP method; validated when the request is built
    #[serde(default = "default_method")]
    pub method: String,

    /// Query string (GET) or body (POST) with `{name}` placeholders
    #[serde(default)]
    pub template: Option<String>,

    /// Values substituted into the template
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,

    /// Request headers, attached verbatim and sent in name order
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Overrides the runner's request timeout for this probe
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Checks evaluated against the response, in order
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl ProbeDefinition {
    /// Create a GET probe against `base_url` with no template and no checks
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            name: None,
            base_url: base_url.into(),
            method: default_method(),
            template: None,
            parameters: BTreeMap::new(),
            headers: BTreeMap::new(),
            timeout_secs: None,
            checks: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout_secs(mut self, seconds: u64) -> Self {
        self.timeout_secs = Some(seconds);
        self
    }

    pub fn with_check(mut self, check: CheckSpec) -> Self {
        self.checks.push(check);
        self
    }

    /// Name for logs: the configured name, or the base address
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.base_url)
    }
}

/// Reference to a checker by identifier, plus the parameters it is
/// initialized with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub checker: String,

    #[serde(default)]
    pub parameters: Parameters,
}

impl CheckSpec {
    pub fn new(checker: impl Into<String>) -> Self {
        Self { checker: checker.into(), parameters: Parameters::new() }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}
