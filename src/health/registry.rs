//! Per-resource advisor registry.
//!
//! # Responsibilities
//! - Hold one advisor per named resource for the life of the process
//! - Create advisors lazily from default or per-resource settings
//! - Report a read-only view of every tracked resource

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{HealthConfig, ResilienceConfig};
use crate::health::advisor::{AdvisorSettings, HealthAdvisor};
use crate::health::shared::SharedHealthAdvisor;
use crate::health::state::ResourceHealth;

/// Registry of [`SharedHealthAdvisor`]s keyed by resource name.
#[derive(Debug)]
pub struct AdvisorRegistry {
    advisors: DashMap<String, SharedHealthAdvisor>,
    defaults: AdvisorSettings,
    overrides: HashMap<String, AdvisorSettings>,
    clock: Arc<dyn Clock>,
}

impl AdvisorRegistry {
    pub fn new(defaults: &HealthConfig) -> Self {
        Self {
            advisors: DashMap::new(),
            defaults: AdvisorSettings::from(defaults),
            overrides: HashMap::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Build a registry and pre-create every declared resource.
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(config: &ResilienceConfig, clock: Arc<dyn Clock>) -> Self {
        let mut registry = Self::new(&config.health);
        registry.clock = clock;

        for resource in &config.resources {
            if let Some(health) = &resource.health {
                registry.overrides.insert(resource.name.clone(), AdvisorSettings::from(health));
            }
            registry.get_or_create(&resource.name);
        }

        tracing::debug!(resources = registry.len(), "Advisor registry initialized");
        registry
    }

    /// Advisor for `name`, created on first use.
    pub fn get_or_create(&self, name: &str) -> SharedHealthAdvisor {
        if let Some(existing) = self.advisors.get(name) {
            return existing.value().clone();
        }

        self.advisors
            .entry(name.to_string())
            .or_insert_with(|| {
                let settings = self
                    .overrides
                    .get(name)
                    .copied()
                    .unwrap_or(self.defaults);
                tracing::debug!(resource = %name, ?settings, "Creating health advisor");
                HealthAdvisor::new(name, settings)
                    .with_clock(self.clock.clone())
                    .into()
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<SharedHealthAdvisor> {
        self.advisors.get(name).map(|a| a.value().clone())
    }

    pub fn len(&self) -> usize {
        self.advisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advisors.is_empty()
    }

    /// View of every advisor, sorted by name.
    pub fn snapshot(&self) -> Vec<ResourceHealth> {
        // Collect handles first so no shard lock is held while advisor locks are taken.
        let advisors: Vec<SharedHealthAdvisor> = self.advisors.iter().map(|e| e.value().clone()).collect();
        let mut views: Vec<ResourceHealth> = advisors.iter().map(SharedHealthAdvisor::snapshot).collect();
        views.sort_by(|a, b| a.name.cmp(&b.name));
        views
    }
}
