use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checks::{Parameters, Verdict};
use crate::definition::CheckSpec;
use crate::request::{Method, ProbeRequest};
use crate::transport::Response;

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Outcome of one check. Created once per configured check and never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    checker: String,
    parameters: Parameters,
    success: bool,
    message: String,
    #[serde(rename = "duration_ms", with = "millis")]
    duration: Duration,
}

impl CheckResult {
    pub(crate) fn new(spec: &CheckSpec, verdict: Verdict, duration: Duration) -> Self {
        Self {
            checker: spec.checker.clone(),
            parameters: spec.parameters.clone(),
            success: verdict.success,
            message: verdict.message,
            duration,
        }
    }

    /// Identifier of the checker that produced this result
    pub fn checker(&self) -> &str {
        &self.checker
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Time spent constructing and evaluating the checker
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Why a run stopped before completing its checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum AbortReason {
    Transport(String),
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Transport(error) => write!(f, "transport error: {error}"),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Aborted { reason: AbortReason },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::Aborted { reason } => write!(f, "aborted ({reason})"),
        }
    }
}

/// The request that was sent, without headers or body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub method: Method,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSummary {
    pub status: u16,
    #[serde(rename = "elapsed_ms", with = "millis")]
    pub elapsed: Duration,
}

/// Aggregate outcome of one probe run.
///
/// Only the runner mutates a result (appending check results and finalizing
/// it); callers receive it finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    probe: String,
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    request: Option<RequestSummary>,
    response: Option<ResponseSummary>,
    checks: Vec<CheckResult>,
    outcome: RunOutcome,
    success: bool,
}

impl ProbeResult {
    pub(crate) fn begin(probe: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            probe: probe.into(),
            start: now,
            stop: now,
            request: None,
            response: None,
            checks: Vec::new(),
            outcome: RunOutcome::Completed,
            success: false,
        }
    }

    pub(crate) fn record_request(&mut self, request: &ProbeRequest) {
        self.request = Some(RequestSummary { method: request.method, url: request.url.clone() });
    }

    pub(crate) fn record_response(&mut self, response: &Response) {
        self.response = Some(ResponseSummary { status: response.status, elapsed: response.elapsed });
    }

    pub(crate) fn push(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    fn stamp_stop(&mut self) {
        // wall clocks can step backwards; keep start <= stop
        self.stop = Utc::now().max(self.start);
    }

    /// Finish a run whose checks all executed. Success is the conjunction of
    /// the check results, so zero checks count as success.
    pub(crate) fn complete(&mut self) {
        self.stamp_stop();
        self.outcome = RunOutcome::Completed;
        self.success = self.checks.iter().all(CheckResult::success);
    }

    /// Finish a run that stopped early. Always a failure.
    pub(crate) fn abort(&mut self, reason: AbortReason) {
        self.stamp_stop();
        self.outcome = RunOutcome::Aborted { reason };
        self.success = false;
    }

    /// Probe name, or its base address when unnamed
    pub fn probe(&self) -> &str {
        &self.probe
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn stop(&self) -> DateTime<Utc> {
        self.stop
    }

    /// Wall-clock duration of the whole run
    pub fn duration(&self) -> Duration {
        (self.stop - self.start).to_std().unwrap_or_default()
    }

    pub fn request(&self) -> Option<&RequestSummary> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&ResponseSummary> {
        self.response.as_ref()
    }

    /// Check results in configuration order
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    pub fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted { .. })
    }

    /// Overall success.
    ///
    /// A completed run succeeds when every check succeeded. A completed run
    /// without checks is a success: nothing failed. Aborted runs never succeed.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Abort reason, if the run did not complete
    pub fn message(&self) -> Option<String> {
        match &self.outcome {
            RunOutcome::Completed => None,
            RunOutcome::Aborted { reason } => Some(reason.to_string()),
        }
    }

    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|check| check.success()).count()
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.success { "SUCCESS" } else { "FAILURE" };
        write!(
            f,
            "{}: {verdict} {} ({}/{} checks passed, {} ms)",
            self.probe,
            self.outcome,
            self.passed(),
            self.checks.len(),
            self.duration().as_millis()
        )
    }
}
