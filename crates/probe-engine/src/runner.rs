//! Probe execution.
//!
//! A [`ProbeRunner`] holds what runs may share (transport, checker registry,
//! configuration). Every call to [`ProbeRunner::run`] creates its own run
//! state, so one runner can drive any number of concurrent runs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cancel::Cancellation;
use crate::checks::{CheckContext, CheckerRegistry, dispatch};
use crate::definition::ProbeDefinition;
use crate::error::{ProbeError, TransportError};
use crate::request::{ProbeRequest, RequestBuilder};
use crate::result::{AbortReason, ProbeResult};
use crate::transport::{HttpTransport, Transport};

/// Default bound on the network exchange of a single run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response body excerpt logged for error statuses
const ERROR_BODY_EXCERPT: usize = 512;

/// Settings shared by every run of a [`ProbeRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound for sending the request and reading the response
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT }
    }
}

impl RunnerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    RequestPending,
    Requested,
    Checking,
    Completed,
    Aborted,
}

impl RunState {
    pub fn can_transition(self, next: RunState) -> bool {
        use RunState::*;

        matches!(
            (self, next),
            (Idle, RequestPending)
                | (RequestPending, Requested)
                | (RequestPending, Aborted)
                | (Requested, Checking)
                | (Requested, Aborted)
                | (Checking, Completed)
                | (Checking, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::RequestPending => "request-pending",
            RunState::Requested => "requested",
            RunState::Checking => "checking",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Executes probe definitions, one network exchange per run.
#[derive(Clone)]
pub struct ProbeRunner {
    transport: Arc<dyn Transport>,
    registry: Arc<CheckerRegistry>,
    builder: RequestBuilder,
    config: RunnerConfig,
}

impl fmt::Debug for ProbeRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRunner")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProbeRunner {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<CheckerRegistry>,
        config: RunnerConfig,
    ) -> Self {
        Self { transport, registry, builder: RequestBuilder::new(), config }
    }

    /// Runner over [`HttpTransport`] with the built-in checkers
    pub fn http(config: RunnerConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::new(Arc::new(transport), Arc::new(CheckerRegistry::with_builtin()), config))
    }

    pub fn registry(&self) -> &CheckerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Build and validate the request of `definition` without sending it
    pub fn prepare(&self, definition: &ProbeDefinition) -> Result<ProbeRequest, ProbeError> {
        self.builder.build(definition)
    }

    /// Run `definition` once.
    ///
    /// Returns `Err` only for configuration errors found before any network
    /// call. Transport failures and failing checks are reported in the
    /// [`ProbeResult`].
    pub async fn run(&self, definition: &ProbeDefinition) -> Result<ProbeResult, ProbeError> {
        self.run_with_cancellation(definition, &Cancellation::new()).await
    }

    /// Like [`run`](Self::run), but stops early once `cancellation` fires.
    ///
    /// Cancellation interrupts the pending request, or skips the checks that
    /// have not started yet. A check that already started runs to completion.
    pub async fn run_with_cancellation(
        &self,
        definition: &ProbeDefinition,
        cancellation: &Cancellation,
    ) -> Result<ProbeResult, ProbeError> {
        ProbeRun::new(self, definition).execute(cancellation).await
    }

    fn timeout_for(&self, definition: &ProbeDefinition) -> Duration {
        definition.timeout_secs.map(Duration::from_secs).unwrap_or(self.config.timeout)
    }
}

/// State of a single run, owned by the `run` call that created it
struct ProbeRun<'a> {
    runner: &'a ProbeRunner,
    definition: &'a ProbeDefinition,
    state: RunState,
    result: ProbeResult,
}

impl<'a> ProbeRun<'a> {
    fn new(runner: &'a ProbeRunner, definition: &'a ProbeDefinition) -> Self {
        Self {
            runner,
            definition,
            state: RunState::Idle,
            result: ProbeResult::begin(definition.label()),
        }
    }

    fn transition(&mut self, next: RunState) {
        debug_assert!(self.state.can_transition(next), "invalid transition {} -> {next}", self.state);
        debug!(probe = %self.definition.label(), from = %self.state, to = %next, "Run state change");
        self.state = next;
    }

    fn abort(mut self, reason: AbortReason) -> ProbeResult {
        self.transition(RunState::Aborted);
        warn!(probe = %self.definition.label(), %reason, "Probe run aborted");
        self.result.abort(reason);
        self.result
    }

    async fn execute(mut self, cancellation: &Cancellation) -> Result<ProbeResult, ProbeError> {
        let definition = self.definition;
        self.transition(RunState::RequestPending);

        let request = self.runner.prepare(definition)?;
        self.result.record_request(&request);

        let timeout = self.runner.timeout_for(definition);
        let transport = Arc::clone(&self.runner.transport);

        info!(probe = %definition.label(), method = %request.method, url = %request.url, "Doing request");

        let sent = tokio::select! {
            biased;
            _ = cancellation.cancelled() => None,
            sent = tokio::time::timeout(timeout, transport.send(&request)) => Some(sent),
        };

        let response = match sent {
            None => return Ok(self.abort(AbortReason::Cancelled)),
            Some(Err(_elapsed)) => {
                let error = TransportError::Timeout(timeout);
                return Ok(self.abort(AbortReason::Transport(error.to_string())));
            }
            Some(Ok(Err(error))) => return Ok(self.abort(AbortReason::Transport(error.to_string()))),
            Some(Ok(Ok(response))) => response,
        };

        self.transition(RunState::Requested);
        self.result.record_response(&response);

        info!(
            probe = %definition.label(),
            status = response.status,
            elapsed_ms = response.elapsed.as_millis() as u64,
            "Response received"
        );
        if response.is_error_status() {
            let excerpt: String = response.text().chars().take(ERROR_BODY_EXCERPT).collect();
            warn!(probe = %definition.label(), status = response.status, body = %excerpt, "Error response");
        }

        self.transition(RunState::Checking);

        let context = CheckContext { probe: definition, request: &request, response: &response };
        for spec in &definition.checks {
            if cancellation.is_cancelled() {
                return Ok(self.abort(AbortReason::Cancelled));
            }
            let check = dispatch(&self.runner.registry, spec, &context);
            self.result.push(check);
        }

        self.transition(RunState::Completed);
        self.result.complete();

        info!(
            probe = %definition.label(),
            success = self.result.success(),
            passed = self.result.passed(),
            checks = self.result.checks().len(),
            duration_ms = self.result.duration().as_millis() as u64,
            "Probe run completed"
        );
        Ok(self.result)
    }
}
