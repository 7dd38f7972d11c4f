//! Outcome of a single matching attempt

use crate::{Entity, Resource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Status of a matching attempt or of a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockStatus {
    /// The queue group was empty
    NoTargetEntities,
    /// An entity asked for a resource that is not defined
    UndefinedResource,
    /// Every resource is fully used
    NoAvailable,
    /// Free resources exist but no queued entity fits them
    NoEntityForAvailableEnvs,
    /// A shared slot was taken
    SuccessLocked,
    /// The whole resource was taken
    SuccessHardLocked,
    /// The bounded wait expired
    Timeout,
}

impl LockStatus {
    /// Statuses the bounded wait keeps retrying
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::NoAvailable | Self::NoEntityForAvailableEnvs)
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::SuccessLocked | Self::SuccessHardLocked)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoTargetEntities => "NO_TARGET_ENTITIES",
            Self::UndefinedResource => "UNDEFINED_RESOURCE",
            Self::NoAvailable => "NO_AVAILABLE",
            Self::NoEntityForAvailableEnvs => "NO_ENTITY_FOR_AVAILABLE_ENVS",
            Self::SuccessLocked => "SUCCESS_LOCKED",
            Self::SuccessHardLocked => "SUCCESS_HARD_LOCKED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds of a waiting `acquire`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up with `Timeout` once this much time has passed
    pub timeout: Duration,
    /// Sleep between matching attempts
    pub poll_interval: Duration,
}

impl WaitOptions {
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Result of one matching attempt
///
/// Successful results carry both the granted resource and the entity it
/// was granted for. `UndefinedResource` carries the discarded entity and
/// `Timeout` a message listing the entities still queued.
#[derive(Debug, Clone)]
pub struct LockResult<T> {
    status: LockStatus,
    resource: Option<Arc<Resource>>,
    entity: Option<Entity<T>>,
    message: Option<String>,
}

impl<T> LockResult<T> {
    /// A result with nothing attached
    #[must_use]
    pub fn status_only(status: LockStatus) -> Self {
        Self {
            status,
            resource: None,
            entity: None,
            message: None,
        }
    }

    /// A granted lock; `hard` selects `SuccessHardLocked`
    #[must_use]
    pub fn locked(resource: Arc<Resource>, entity: Entity<T>, hard: bool) -> Self {
        let status = if hard {
            LockStatus::SuccessHardLocked
        } else {
            LockStatus::SuccessLocked
        };
        Self {
            status,
            resource: Some(resource),
            entity: Some(entity),
            message: None,
        }
    }

    #[must_use]
    pub fn undefined_resource(entity: Entity<T>) -> Self {
        let message = format!("no resource matches required name '{}'", entity.required());
        Self {
            status: LockStatus::UndefinedResource,
            resource: None,
            entity: Some(entity),
            message: Some(message),
        }
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: LockStatus::Timeout,
            resource: None,
            entity: None,
            message: Some(message.into()),
        }
    }

    pub fn status(&self) -> LockStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn resource(&self) -> Option<&Arc<Resource>> {
        self.resource.as_ref()
    }

    pub fn entity(&self) -> Option<&Entity<T>> {
        self.entity.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn into_entity(self) -> Option<Entity<T>> {
        self.entity
    }

    /// Granted resource and entity of a successful result
    ///
    /// # Errors
    ///
    /// Returns the result unchanged if it is not a success.
    pub fn into_grant(self) -> Result<(Arc<Resource>, Entity<T>), Self> {
        match self {
            Self {
                status,
                resource: Some(resource),
                entity: Some(entity),
                ..
            } if status.is_success() => Ok((resource, entity)),
            other => Err(other),
        }
    }
}

impl<T> fmt::Display for LockResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(resource) = &self.resource {
            write!(f, " on {resource}")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}
