//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use service_resilience::clock::ManualClock;
use service_resilience::health::{AdvisorSettings, HealthAdvisor, SharedHealthAdvisor};
use service_resilience::resilience::{BackoffRetryExecutor, RetryPolicy, Sleeper};

/// Records requested delays instead of blocking.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

/// Executor whose blocking waits are recorded.
pub fn recording_executor(policy: RetryPolicy) -> (BackoffRetryExecutor, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = BackoffRetryExecutor::new(policy).with_sleeper(sleeper.clone());
    (executor, sleeper)
}

/// Shared advisor driven by a manual clock.
#[allow(dead_code)]
pub fn manual_advisor(name: &str, max_failure_count: u32, cooldown: Duration) -> (SharedHealthAdvisor, ManualClock) {
    let clock = ManualClock::new();
    let settings = AdvisorSettings {
        max_failure_count,
        unhealthy_duration: cooldown,
        extend_duration_on_immediate_failure: false,
    };
    let advisor = HealthAdvisor::new(name, settings).with_clock(Arc::new(clock.clone()));
    (advisor.into(), clock)
}
