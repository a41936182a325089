use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{info, warn};

use super::{CheckContext, CheckerRegistry, Verdict};
use crate::definition::CheckSpec;
use crate::error::CheckError;
use crate::result::CheckResult;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f`, turning a panic into [`CheckError::Panicked`].
pub fn isolate<T>(f: impl FnOnce() -> Result<T, CheckError>) -> Result<T, CheckError> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(CheckError::Panicked(panic_message(payload.as_ref()))))
}

/// Construct, initialize and evaluate the checker named by `spec`.
///
/// Never fails: any error or panic along the way becomes a failing
/// [`CheckResult`] carrying the error message.
pub fn dispatch(
    registry: &CheckerRegistry,
    spec: &CheckSpec,
    context: &CheckContext<'_>,
) -> CheckResult {
    let start = Instant::now();

    let outcome = isolate(|| {
        let mut checker = registry.create(&spec.checker)?;
        checker.initialize(&spec.parameters)?;
        checker.evaluate(context)
    });

    let verdict = match outcome {
        Ok(verdict) => verdict,
        Err(error) => {
            warn!(checker = %spec.checker, %error, "Check raised an error");
            Verdict::fail(error.to_string())
        }
    };

    info!(checker = %spec.checker, success = verdict.success, message = %verdict.message, "Check evaluated");

    CheckResult::new(spec, verdict, start.elapsed())
}
