//! Shared helpers for probe-engine integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use probe_engine::{
    CheckContext, CheckError, Checker, CheckerRegistry, Parameters, ProbeRequest, ProbeRunner,
    Response, RunnerConfig, Transport, TransportError, Verdict,
};

/// Transport that answers every request with a scripted outcome
pub struct FakeTransport {
    outcome: Result<Response, TransportError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ProbeRequest>>,
}

impl FakeTransport {
    pub fn responding(response: Response) -> Self {
        Self::with_outcome(Ok(response))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<Response, TransportError>) -> Self {
        Self { outcome, delay: None, calls: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProbeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &ProbeRequest) -> Result<Response, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Counts how many times checkers built by its factory were evaluated
#[derive(Clone, Default)]
pub struct EvaluationCounter(Arc<AtomicUsize>);

impl EvaluationCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct CountingChecker(EvaluationCounter);

impl Checker for CountingChecker {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, _context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        self.0.0.fetch_add(1, Ordering::SeqCst);
        Ok(Verdict::pass("counted"))
    }
}

#[derive(Default)]
struct FailingEvaluation;

impl Checker for FailingEvaluation {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, _context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        Err(CheckError::Evaluation("schema document unavailable".to_string()))
    }
}

#[derive(Default)]
struct Panicking;

impl Checker for Panicking {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, _context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        panic!("index out of range")
    }
}

/// Built-in checkers plus misbehaving and counting test checkers
pub fn test_registry(counter: &EvaluationCounter) -> CheckerRegistry {
    let mut registry = CheckerRegistry::with_builtin();
    registry.register_default::<FailingEvaluation>("failing-evaluation");
    registry.register_default::<Panicking>("panicking");
    registry.register("unconstructible", || {
        Err(CheckError::Construction("missing dependency".to_string()))
    });
    let counter = counter.clone();
    registry.register("counting", move || {
        Ok(Box::new(CountingChecker(counter.clone())) as Box<dyn Checker>)
    });
    registry
}

pub fn runner_with(transport: Arc<FakeTransport>, counter: &EvaluationCounter) -> ProbeRunner {
    ProbeRunner::new(transport, Arc::new(test_registry(counter)), RunnerConfig::default())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
