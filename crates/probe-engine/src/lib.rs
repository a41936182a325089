//! probe-engine - single probe execution for resource monitoring
//!
//! A probe run builds one request from a [`ProbeDefinition`], sends it through
//! a [`Transport`], evaluates every configured [`Checker`] against the
//! response in isolation and aggregates the outcomes into a [`ProbeResult`].
//!
//! Scheduling, persistence and notification are left to the caller.

pub mod cancel;
pub mod checks;
pub mod definition;
pub mod error;
pub mod request;
pub mod result;
pub mod runner;
pub mod template;
pub mod transport;

// Re-export main types
pub use cancel::Cancellation;
pub use checks::{CheckContext, Checker, CheckerRegistry, Parameters, Verdict};
pub use definition::{CheckSpec, ProbeDefinition};
pub use error::{CheckError, ProbeError, TemplateError, TransportError};
pub use request::{Method, ProbeRequest, RequestBuilder};
pub use result::{AbortReason, CheckResult, ProbeResult, RunOutcome};
pub use runner::{ProbeRunner, RunState, RunnerConfig};
pub use transport::{HttpTransport, Response, Transport};
