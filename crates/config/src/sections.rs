//! Configuration sections shared by the registry and the lock controller

use envroute_types::{Entity, Priority, RequiredResource, WaitOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Resource discovery and routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Directory holding one subdirectory per resource
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Resource used by entities that do not name one
    #[serde(default)]
    pub default: Option<String>,
    /// Resource every entity is routed to, whatever it asks for
    #[serde(default)]
    pub forced: Option<String>,
    #[serde(default = "default_max_concurrent_per_resource")]
    pub max_concurrent_per_resource: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            default: None,
            forced: None,
            max_concurrent_per_resource: 1,
        }
    }
}

impl ResourceConfig {
    /// Resolve the resource an entity requires
    ///
    /// A forced name wins over everything, then the entity's own name, then
    /// the configured default. Without any of them the entity accepts any
    /// resource.
    #[must_use]
    pub fn resolve_required(&self, name: Option<&str>) -> RequiredResource {
        if let Some(forced) = non_blank(self.forced.as_deref()) {
            return RequiredResource::parse(forced);
        }
        match non_blank(name).or_else(|| non_blank(self.default.as_deref())) {
            Some(name) => RequiredResource::parse(name),
            None => RequiredResource::Any,
        }
    }

    /// Build an entity from its source annotations
    pub fn entity<T>(
        &self,
        payload: T,
        name: Option<&str>,
        priority: Option<i32>,
        exclusive: bool,
    ) -> Entity<T> {
        Entity::new(payload, self.resolve_required(name))
            .with_priority(priority.map_or(Priority::LOWEST, Priority::new))
            .with_exclusive(exclusive)
    }
}

/// Bounded wait configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000, // 1 minute
            poll_interval_ms: 500,
        }
    }
}

impl LockConfig {
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new(
            Duration::from_millis(self.timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// Default value functions for serde
fn default_directory() -> PathBuf {
    PathBuf::from("environments")
}

fn default_max_concurrent_per_resource() -> usize {
    1
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    500
}
