//! Side-effect hooks fired on health transitions.

use std::fmt;
use std::sync::Arc;

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Optional callbacks invoked by a [`HealthAdvisor`](super::HealthAdvisor).
///
/// Hooks run synchronously on the caller's thread. When the advisor is shared
/// through [`SharedHealthAdvisor`](super::SharedHealthAdvisor) they run while its
/// lock is held, so a hook must not call back into the same advisor.
#[derive(Clone, Default)]
pub struct HealthHooks {
    on_enter_unhealthy: Option<Hook>,
    on_exit_unhealthy: Option<Hook>,
    on_reporting_while_unhealthy: Option<Hook>,
}

impl HealthHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once on the Healthy → Unhealthy transition.
    pub fn on_enter_unhealthy(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_enter_unhealthy = Some(Arc::new(hook));
        self
    }

    /// Called once on the Unhealthy → Healthy transition.
    pub fn on_exit_unhealthy(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_exit_unhealthy = Some(Arc::new(hook));
        self
    }

    /// Called on every `is_healthy` poll answered with `false`.
    pub fn on_reporting_while_unhealthy(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reporting_while_unhealthy = Some(Arc::new(hook));
        self
    }

    pub(crate) fn entered_unhealthy(&self) {
        if let Some(hook) = &self.on_enter_unhealthy {
            hook();
        }
    }

    pub(crate) fn exited_unhealthy(&self) {
        if let Some(hook) = &self.on_exit_unhealthy {
            hook();
        }
    }

    pub(crate) fn reported_unhealthy(&self) {
        if let Some(hook) = &self.on_reporting_while_unhealthy {
            hook();
        }
    }
}

impl fmt::Debug for HealthHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthHooks")
            .field("on_enter_unhealthy", &self.on_enter_unhealthy.is_some())
            .field("on_exit_unhealthy", &self.on_exit_unhealthy.is_some())
            .field("on_reporting_while_unhealthy", &self.on_reporting_while_unhealthy.is_some())
            .finish()
    }
}
