//! Health-gated retry execution.
//!
//! Consults an advisor before calling, runs the retry loop, then reports the
//! final outcome back. One call reports exactly one success or one failure,
//! however many attempts the executor made.

use std::future::Future;
use thiserror::Error;

use crate::health::SharedHealthAdvisor;
use crate::resilience::retries::BackoffRetryExecutor;

/// Error from a guarded call.
#[derive(Debug, Error)]
pub enum GuardedError<E> {
    /// The advisor reported the resource unhealthy; the operation was not run.
    #[error("resource '{0}' is unhealthy")]
    Unhealthy(String),

    #[error("{0}")]
    Operation(E),
}

impl<E> GuardedError<E> {
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, GuardedError::Unhealthy(_))
    }
}

/// Blocking guarded call.
pub fn call<T, E, F>(
    advisor: &SharedHealthAdvisor,
    executor: &BackoffRetryExecutor,
    operation: F,
) -> Result<T, GuardedError<E>>
where
    F: FnMut() -> Result<T, E>,
{
    if !advisor.is_healthy() {
        return Err(GuardedError::Unhealthy(advisor.name()));
    }

    let result = executor.execute(operation);
    report(advisor, result)
}

/// Async guarded call.
pub async fn call_async<T, E, F, Fut>(
    advisor: &SharedHealthAdvisor,
    executor: &BackoffRetryExecutor,
    operation: F,
) -> Result<T, GuardedError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if !advisor.is_healthy() {
        return Err(GuardedError::Unhealthy(advisor.name()));
    }

    let result = executor.execute_async(operation).await;
    report(advisor, result)
}

fn report<T, E>(advisor: &SharedHealthAdvisor, result: Result<T, E>) -> Result<T, GuardedError<E>> {
    match result {
        Ok(value) => {
            advisor.record_success();
            Ok(value)
        }
        Err(e) => {
            advisor.record_failure();
            Err(GuardedError::Operation(e))
        }
    }
}
