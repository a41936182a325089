//! End-to-end probe runs against a fake transport

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{EvaluationCounter, FakeTransport, init_tracing, runner_with, test_registry};
use probe_engine::{
    AbortReason, Cancellation, CheckContext, CheckError, CheckSpec, Checker, Method, Parameters,
    ProbeDefinition, ProbeError, ProbeRunner, Response, RunOutcome, RunnerConfig, TemplateError,
    TransportError, Verdict,
};
use tokio_test::{assert_err, assert_ok};

fn ows_probe() -> ProbeDefinition {
    ProbeDefinition::new("http://svc/ows")
        .with_name("ows-capabilities")
        .with_template("?request={op}")
        .with_parameter("op", "GetCapabilities")
        .with_check(CheckSpec::new("status-is-200"))
}

#[tokio::test]
async fn test_get_capabilities_success() {
    init_tracing();
    let transport = Arc::new(FakeTransport::responding(Response::new(200)));
    let runner = runner_with(transport.clone(), &EvaluationCounter::default());

    let result = assert_ok!(runner.run(&ows_probe()).await);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, "http://svc/ows?request=GetCapabilities");

    assert_eq!(result.checks().len(), 1);
    assert!(result.checks()[0].success());
    assert_eq!(result.checks()[0].message(), "200");
    assert!(result.success());
    assert_eq!(result.outcome(), &RunOutcome::Completed);
    assert_eq!(result.response().map(|r| r.status), Some(200));
    assert_eq!(result.request().map(|r| r.url.as_str()), Some("http://svc/ows?request=GetCapabilities"));
}

#[tokio::test]
async fn test_get_capabilities_server_error() {
    init_tracing();
    let transport = Arc::new(FakeTransport::responding(Response::new(500).with_body("Internal Server Error")));
    let runner = runner_with(transport, &EvaluationCounter::default());

    let result = assert_ok!(runner.run(&ows_probe()).await);

    assert_eq!(result.checks().len(), 1);
    assert!(!result.checks()[0].success());
    assert!(result.checks()[0].message().contains("500"));
    assert!(!result.success());
    // an error status is a check failure, not an aborted run
    assert_eq!(result.outcome(), &RunOutcome::Completed);
}

#[tokio::test]
async fn test_error_status_without_checks_is_success() {
    let transport = Arc::new(FakeTransport::responding(Response::new(503)));
    let runner = runner_with(transport, &EvaluationCounter::default());

    let result = assert_ok!(runner.run(&ProbeDefinition::new("http://svc/ows")).await);

    assert!(result.checks().is_empty());
    assert!(result.success());
}

#[tokio::test]
async fn test_one_result_per_check_in_order() {
    let response = Response::new(200)
        .with_header("Content-Type", "text/xml")
        .with_body("<WMS_Capabilities/>");
    let transport = Arc::new(FakeTransport::responding(response));
    let runner = runner_with(transport, &EvaluationCounter::default());

    let definition = ProbeDefinition::new("http://svc/ows")
        .with_check(CheckSpec::new("http-status-no-error"))
        .with_check(CheckSpec::new("contains-strings").with_parameter("strings", vec!["WMS_Capabilities"]))
        .with_check(CheckSpec::new("http-has-content-type").with_parameter("header_value", "text/xml"))
        .with_check(CheckSpec::new("json-parse"));

    let result = assert_ok!(runner.run(&definition).await);

    let checkers: Vec<&str> = result.checks().iter().map(|c| c.checker()).collect();
    assert_eq!(
        checkers,
        vec!["http-status-no-error", "contains-strings", "http-has-content-type", "json-parse"]
    );
    let outcomes: Vec<bool> = result.checks().iter().map(|c| c.success()).collect();
    assert_eq!(outcomes, vec![true, true, true, false]);
    assert!(!result.success());
    assert_eq!(result.checks()[1].parameters()["strings"], serde_json::json!(["WMS_Capabilities"]));
}

#[tokio::test]
async fn test_misbehaving_checks_are_isolated() {
    init_tracing();
    let counter = EvaluationCounter::default();
    let transport = Arc::new(FakeTransport::responding(Response::new(200)));
    let runner = runner_with(transport, &counter);

    let definition = ProbeDefinition::new("http://svc/ows")
        .with_check(CheckSpec::new("panicking"))
        .with_check(CheckSpec::new("counting"))
        .with_check(CheckSpec::new("failing-evaluation"))
        .with_check(CheckSpec::new("unconstructible"))
        .with_check(CheckSpec::new("no-such-checker"))
        .with_check(CheckSpec::new("http-status-in"))
        .with_check(CheckSpec::new("counting"));

    let result = assert_ok!(runner.run(&definition).await);

    assert_eq!(result.checks().len(), 7);
    assert_eq!(counter.count(), 2);
    assert_eq!(result.outcome(), &RunOutcome::Completed);
    assert!(!result.success());

    let checks = result.checks();
    assert!(!checks[0].success());
    assert!(checks[0].message().contains("index out of range"));
    assert!(checks[1].success());
    assert!(!checks[2].success());
    assert!(checks[2].message().contains("schema document unavailable"));
    assert!(!checks[3].success());
    assert!(checks[3].message().contains("missing dependency"));
    assert!(!checks[4].success());
    assert!(checks[4].message().contains("no-such-checker"));
    assert!(!checks[5].success());
    assert!(checks[5].message().contains("invalid parameters"));
    assert!(checks[6].success());
}

#[tokio::test]
async fn test_transport_failure_aborts_without_checks() {
    let counter = EvaluationCounter::default();
    let transport = Arc::new(FakeTransport::failing(TransportError::Connect("connection refused".to_string())));
    let runner = runner_with(transport.clone(), &counter);

    let definition = ows_probe().with_check(CheckSpec::new("counting"));
    let result = assert_ok!(runner.run(&definition).await);

    assert_eq!(transport.calls(), 1);
    assert_eq!(counter.count(), 0);
    assert!(result.checks().is_empty());
    assert!(!result.success());
    assert!(result.stop() >= result.start());
    assert!(result.response().is_none());
    assert_eq!(
        result.outcome(),
        &RunOutcome::Aborted {
            reason: AbortReason::Transport("connection failed: connection refused".to_string())
        }
    );
    assert!(result.message().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_timeout_aborts_run() {
    let transport =
        Arc::new(FakeTransport::responding(Response::new(200)).delayed(Duration::from_secs(5)));
    let runner = runner_with(transport, &EvaluationCounter::default());

    let definition = ows_probe().with_timeout_secs(0);
    let result = assert_ok!(runner.run(&definition).await);

    assert!(result.is_aborted());
    assert!(result.checks().is_empty());
    assert!(result.message().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_configuration_errors_abort_before_request() {
    let transport = Arc::new(FakeTransport::responding(Response::new(200)));
    let runner = runner_with(transport.clone(), &EvaluationCounter::default());

    let unsupported = ows_probe().with_method("PUT");
    let err = assert_err!(runner.run(&unsupported).await);
    assert!(matches!(err, ProbeError::UnsupportedMethod(_)));

    let missing = ProbeDefinition::new("http://svc/ows").with_template("?request={op}&layers={layers}")
        .with_parameter("op", "GetMap");
    let err = assert_err!(runner.run(&missing).await);
    assert!(matches!(err, ProbeError::Template(TemplateError::MissingParameter(ref name)) if name == "layers"));

    let invalid = ProbeDefinition::new("svc/ows");
    let err = assert_err!(runner.run(&invalid).await);
    assert!(matches!(err, ProbeError::InvalidRequest(_)));

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_post_sends_resolved_body() {
    let transport = Arc::new(FakeTransport::responding(Response::new(200)));
    let runner = runner_with(transport.clone(), &EvaluationCounter::default());

    let definition = ProbeDefinition::new("http://svc/csw")
        .with_method("POST")
        .with_template("<csw:GetRecords maxRecords=\"{max}\"/>")
        .with_parameter("max", 5)
        .with_header("Content-Type", "application/xml");

    assert_ok!(runner.run(&definition).await);

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://svc/csw");
    assert_eq!(request.body.as_deref(), Some("<csw:GetRecords maxRecords=\"5\"/>"));
    assert_eq!(request.headers, vec![("Content-Type".to_string(), "application/xml".to_string())]);
}

#[tokio::test]
async fn test_cancellation_interrupts_pending_request() {
    let counter = EvaluationCounter::default();
    let transport =
        Arc::new(FakeTransport::responding(Response::new(200)).delayed(Duration::from_secs(30)));
    let runner = runner_with(transport, &counter);
    let cancellation = Cancellation::new();

    let handle = cancellation.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let definition = ows_probe().with_check(CheckSpec::new("counting"));
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        runner.run_with_cancellation(&definition, &cancellation),
    )
    .await
    .expect("cancellation should interrupt the request")
    .unwrap();

    assert_eq!(result.outcome(), &RunOutcome::Aborted { reason: AbortReason::Cancelled });
    assert!(result.checks().is_empty());
    assert_eq!(counter.count(), 0);
    assert!(!result.success());
}

/// Passes, then fires the shared cancellation
struct CancelOnEvaluate(Cancellation);

impl Checker for CancelOnEvaluate {
    fn initialize(&mut self, _parameters: &Parameters) -> Result<(), CheckError> {
        Ok(())
    }

    fn evaluate(&self, _context: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        self.0.cancel();
        Ok(Verdict::pass("cancelled the run"))
    }
}

#[tokio::test]
async fn test_cancellation_between_checks_keeps_finished_results() {
    let counter = EvaluationCounter::default();
    let cancellation = Cancellation::new();

    let mut registry = test_registry(&counter);
    let token = cancellation.clone();
    registry.register("cancel-on-evaluate", move || {
        Ok(Box::new(CancelOnEvaluate(token.clone())) as Box<dyn Checker>)
    });
    let transport = Arc::new(FakeTransport::responding(Response::new(200)));
    let runner = ProbeRunner::new(transport, Arc::new(registry), RunnerConfig::default());

    let definition = ProbeDefinition::new("http://svc/ows")
        .with_check(CheckSpec::new("cancel-on-evaluate"))
        .with_check(CheckSpec::new("status-is-200"))
        .with_check(CheckSpec::new("counting"));

    let result = assert_ok!(runner.run_with_cancellation(&definition, &cancellation).await);

    assert_eq!(result.outcome(), &RunOutcome::Aborted { reason: AbortReason::Cancelled });
    assert_eq!(result.checks().len(), 1);
    assert_eq!(result.checks()[0].checker(), "cancel-on-evaluate");
    assert!(result.checks()[0].success());
    assert_eq!(counter.count(), 0);
    assert!(!result.success());
    assert_eq!(result.response().map(|r| r.status), Some(200));
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let transport = Arc::new(FakeTransport::responding(Response::new(200).with_body("ok")));
    let runner = runner_with(transport.clone(), &EvaluationCounter::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let runner = runner.clone();
            tokio::spawn(async move {
                let mut definition = ProbeDefinition::new(format!("http://svc-{i}/ows"))
                    .with_check(CheckSpec::new("status-is-200"));
                if i % 2 == 1 {
                    definition = definition
                        .with_check(CheckSpec::new("contains-strings").with_parameter("strings", vec!["missing"]));
                }
                runner.run(&definition).await.unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(result.probe(), format!("http://svc-{i}/ows"));
        assert_eq!(result.checks().len(), if i % 2 == 1 { 2 } else { 1 });
        assert_eq!(result.success(), i % 2 == 0);
    }
    assert_eq!(transport.calls(), 8);
}
