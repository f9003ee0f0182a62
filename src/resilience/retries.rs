//! Retry logic.
//!
//! # Responsibilities
//! - Re-run a fallible operation until it succeeds or attempts run out
//! - Wait between attempts on a doubling, capped schedule
//! - Surface the final attempt's error unchanged
//!
//! # Design Decisions
//! - `max_attempts` counts total attempts, not retries
//! - No delay before the first attempt or after the last one
//! - Every error is retryable unless the caller passes a predicate
//! - Blocking and async flavours share one attempt state machine

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::RetryConfig;
use crate::observability::metrics::{self, RetryOutcome};
use crate::resilience::backoff::Backoff;
use crate::resilience::sleep::{Sleeper, ThreadSleeper};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Attempt and delay limits for a [`BackoffRetryExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts; 0 behaves like 1.
    pub max_attempts: u32,
    /// Delay before the first retry; zero disables waiting.
    pub initial_backoff: Duration,
    /// Delay cap; zero leaves growth uncapped.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_backoff, self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }
}

/// Error from a shutdown-aware execution.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("operation cancelled by shutdown")]
    Cancelled,

    #[error("{0}")]
    Operation(E),
}

impl<E> RetryError<E> {
    /// The operation's error, if the run was not cancelled.
    pub fn into_operation(self) -> Option<E> {
        match self {
            RetryError::Cancelled => None,
            RetryError::Operation(e) => Some(e),
        }
    }
}

/// Per-invocation attempt counter and backoff schedule.
struct RetryState {
    attempts: u32,
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryState {
    fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempts: 0,
            max_attempts: policy.max_attempts,
            backoff: policy.backoff(),
        }
    }

    fn on_success(&self) {
        metrics::record_retry_attempt(RetryOutcome::Success);
    }

    /// `None` when the failure is terminal, otherwise the delay before the next attempt.
    fn on_failure(&mut self, retryable: bool) -> Option<Duration> {
        self.attempts = self.attempts.saturating_add(1);

        if self.attempts >= self.max_attempts {
            tracing::debug!(attempt = self.attempts, "Retry attempts exhausted");
            metrics::record_retry_attempt(RetryOutcome::Exhausted);
            return None;
        }

        if !retryable {
            tracing::debug!(attempt = self.attempts, "Error is not retryable");
            metrics::record_retry_attempt(RetryOutcome::Rejected);
            return None;
        }

        // Intermediate failures are counted, not logged.
        let delay = self.backoff.next_delay().unwrap_or(Duration::ZERO);
        metrics::record_retry_attempt(RetryOutcome::Retry);
        if !delay.is_zero() {
            metrics::record_backoff(delay);
        }
        Some(delay)
    }
}

/// Runs fallible operations with exponential backoff between attempts.
///
/// Holds no per-call state; one executor may be shared by any number of callers.
#[derive(Clone)]
pub struct BackoffRetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl BackoffRetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replace the blocking wait used by [`execute`](Self::execute).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, blocking the current thread between attempts.
    pub fn execute<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        self.execute_with(operation, |_| true)
    }

    /// Like [`execute`](Self::execute), stopping early when `is_retryable` returns false.
    pub fn execute_with<T, E, F, P>(&self, mut operation: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let mut state = RetryState::new(&self.policy);
        loop {
            match operation() {
                Ok(value) => {
                    state.on_success();
                    return Ok(value);
                }
                Err(e) => match state.on_failure(is_retryable(&e)) {
                    None => return Err(e),
                    Some(delay) if !delay.is_zero() => self.sleeper.sleep(delay),
                    Some(_) => {}
                },
            }
        }
    }

    /// Run `operation`, yielding to the runtime between attempts.
    pub async fn execute_async<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_async_with(operation, |_| true).await
    }

    /// Like [`execute_async`](Self::execute_async), stopping early when `is_retryable` returns false.
    pub async fn execute_async_with<T, E, F, Fut, P>(&self, mut operation: F, is_retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut state = RetryState::new(&self.policy);
        loop {
            match operation().await {
                Ok(value) => {
                    state.on_success();
                    return Ok(value);
                }
                Err(e) => match state.on_failure(is_retryable(&e)) {
                    None => return Err(e),
                    Some(delay) if !delay.is_zero() => tokio::time::sleep(delay).await,
                    Some(_) => {}
                },
            }
        }
    }

    /// Run `operation` asynchronously until it finishes or `shutdown` fires.
    ///
    /// Cancellation is terminal: the in-flight attempt or wait is dropped. A
    /// dropped `Shutdown` closes the channel and cancels the same way.
    pub async fn execute_until_shutdown<T, E, F, Fut>(
        &self,
        operation: F,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        tokio::select! {
            result = self.execute_async(operation) => result.map_err(RetryError::Operation),
            _ = shutdown.recv() => {
                tracing::info!("Retry loop cancelled by shutdown");
                Err(RetryError::Cancelled)
            }
        }
    }
}

impl Default for BackoffRetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl std::fmt::Debug for BackoffRetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackoffRetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Debug, Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, delay: Duration) {
            self.delays.lock().unwrap().push(delay);
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn executor(max_attempts: u32, initial: u64, max: u64) -> (BackoffRetryExecutor, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let executor = BackoffRetryExecutor::new(RetryPolicy {
            max_attempts,
            initial_backoff: ms(initial),
            max_backoff: ms(max),
        })
        .with_sleeper(sleeper.clone());
        (executor, sleeper)
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.initial_backoff.is_zero());
        assert!(policy.max_backoff.is_zero());
    }

    #[test]
    fn test_first_try_success_single_call_no_delay() {
        let (executor, sleeper) = executor(3, 100, 0);
        let mut calls = 0;

        let result: Result<u32, &str> = executor.execute(|| {
            calls += 1;
            Ok(7)
        });

        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[test]
    fn test_always_failing_runs_exactly_max_attempts() {
        let (executor, sleeper) = executor(4, 10, 0);
        let mut calls = 0;

        let result: Result<(), String> = executor.execute(|| {
            calls += 1;
            Err(format!("failure #{calls}"))
        });

        assert_eq!(result, Err("failure #4".to_string()));
        assert_eq!(calls, 4);
        // No delay after the final attempt.
        assert_eq!(*sleeper.delays.lock().unwrap(), vec![ms(10), ms(20), ms(40)]);
    }

    #[test]
    fn test_delays_are_capped() {
        let (executor, sleeper) = executor(6, 100, 300);
        let _: Result<(), ()> = executor.execute(|| Err(()));
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![ms(100), ms(200), ms(300), ms(300), ms(300)]
        );
    }

    #[test]
    fn test_zero_initial_backoff_never_sleeps() {
        let (executor, sleeper) = executor(5, 0, 1000);
        let mut calls = 0;
        let _: Result<(), ()> = executor.execute(|| {
            calls += 1;
            Err(())
        });
        assert_eq!(calls, 5);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[test]
    fn test_single_attempt_means_no_retry() {
        for max_attempts in [0, 1] {
            let (executor, sleeper) = executor(max_attempts, 100, 0);
            let mut calls = 0;
            let _: Result<(), ()> = executor.execute(|| {
                calls += 1;
                Err(())
            });
            assert_eq!(calls, 1);
            assert!(sleeper.delays.lock().unwrap().is_empty());
        }
    }

    #[test]
    fn test_recovers_after_transient_failures() {
        let (executor, sleeper) = executor(3, 50, 0);
        let mut calls = 0;

        let result: Result<&str, &str> = executor.execute(|| {
            calls += 1;
            if calls < 3 { Err("busy") } else { Ok("done") }
        });

        assert_eq!(result, Ok("done"));
        assert_eq!(*sleeper.delays.lock().unwrap(), vec![ms(50), ms(100)]);
    }

    #[test]
    fn test_predicate_stops_on_permanent_error() {
        #[derive(Debug, PartialEq)]
        enum Failure {
            Transient,
            Permanent,
        }

        let (executor, sleeper) = executor(5, 10, 0);
        let mut calls = 0;
        let result: Result<(), Failure> = executor.execute_with(
            || {
                calls += 1;
                if calls == 1 { Err(Failure::Transient) } else { Err(Failure::Permanent) }
            },
            |e| *e == Failure::Transient,
        );

        assert_eq!(result, Err(Failure::Permanent));
        assert_eq!(calls, 2);
        assert_eq!(*sleeper.delays.lock().unwrap(), vec![ms(10)]);
    }

    #[test]
    fn test_only_terminal_outcome_is_logged() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tracing_subscriber::layer::{Context, SubscriberExt};

        struct EventCounter(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCounter {
            fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let events = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(EventCounter(events.clone()));
        let (executor, _sleeper) = executor(5, 10, 0);

        let mut calls = 0;
        tracing::subscriber::with_default(subscriber, || {
            let _: Result<(), ()> = executor.execute(|| {
                calls += 1;
                Err(())
            });
        });

        assert_eq!(calls, 5);
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_delays_between_attempts() {
        let executor = BackoffRetryExecutor::new(RetryPolicy {
            max_attempts: 5,
            initial_backoff: ms(100),
            max_backoff: ms(300),
        });
        let start = Instant::now();
        let calls = Mutex::new(Vec::new());

        let result: Result<(), usize> = executor
            .execute_async(|| {
                let mut calls = calls.lock().unwrap();
                calls.push(start.elapsed());
                let n = calls.len();
                async move { Err(n) }
            })
            .await;

        assert_eq!(result, Err(5));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![ms(0), ms(100), ms(300), ms(600), ms(900)]
        );
        // Nothing is awaited after the final attempt.
        assert_eq!(start.elapsed(), ms(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_zero_backoff_is_immediate() {
        let executor = BackoffRetryExecutor::new(RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: ms(300),
        });
        let start = Instant::now();

        let result: Result<(), ()> = executor.execute_async(|| async { Err(()) }).await;

        assert!(result.is_err());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_retry_loop() {
        let executor = BackoffRetryExecutor::new(RetryPolicy {
            max_attempts: 100,
            initial_backoff: ms(1000),
            max_backoff: Duration::ZERO,
        });
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let trigger = async {
            tokio::time::sleep(ms(2500)).await;
            shutdown.trigger();
        };
        let run = executor.execute_until_shutdown(|| async { Err::<(), _>("down") }, &mut rx);

        let (result, _) = tokio::join!(run, trigger);
        assert!(matches!(result, Err(RetryError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_coordinator_cancels_retry_loop() {
        let executor = BackoffRetryExecutor::new(RetryPolicy {
            max_attempts: 100,
            initial_backoff: ms(1000),
            max_backoff: Duration::ZERO,
        });
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        drop(shutdown);

        let calls = AtomicU32::new(0);
        let result = executor
            .execute_until_shutdown(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>("down") }
                },
                &mut rx,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert!(calls.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test]
    async fn test_shutdown_aware_passes_operation_error_through() {
        let executor = BackoffRetryExecutor::new(RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        });
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        let result = executor
            .execute_until_shutdown(|| async { Err::<(), _>("down") }, &mut rx)
            .await;

        assert_eq!(result.unwrap_err().into_operation(), Some("down"));
    }
}
