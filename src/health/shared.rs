//! Thread-safe handle around a [`HealthAdvisor`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::health::advisor::HealthAdvisor;
use crate::health::state::ResourceHealth;

/// Cloneable, mutex-guarded advisor for callers on several threads or tasks.
///
/// Every operation takes the lock for its whole duration, so a check and the
/// transition it triggers are atomic with respect to other callers.
#[derive(Debug, Clone)]
pub struct SharedHealthAdvisor {
    inner: Arc<Mutex<HealthAdvisor>>,
}

impl SharedHealthAdvisor {
    pub fn new(advisor: HealthAdvisor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(advisor)),
        }
    }

    // The advisor never leaves its fields half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HealthAdvisor> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_healthy(&self) -> bool {
        self.lock().is_healthy()
    }

    pub fn record_failure(&self) {
        self.lock().record_failure();
    }

    pub fn record_success(&self) {
        self.lock().record_success();
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count()
    }

    pub fn snapshot(&self) -> ResourceHealth {
        self.lock().snapshot()
    }

    pub fn name(&self) -> String {
        self.lock().name().to_string()
    }
}

impl From<HealthAdvisor> for SharedHealthAdvisor {
    fn from(advisor: HealthAdvisor) -> Self {
        Self::new(advisor)
    }
}
