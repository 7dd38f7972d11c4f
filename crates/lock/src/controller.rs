//! Matching entities to resources
//!
//! One mutex guards the registry. A matching attempt holds it for its whole
//! duration and takes the queue group's mutex inside it, never the other
//! way round.

use envroute_config::RouterConfig;
use envroute_errors::{Error, LockError};
use envroute_queue::EntityQueueGroup;
use envroute_resources::{discover, ResourceRegistry, SlotState};
use envroute_types::{LockResult, LockStatus, Resource, WaitOptions};
use std::fmt::{self, Display, Write as _};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Hands out resources to queued entities
///
/// Build one per run and share it by reference. Every registry operation
/// goes through the same critical section as the matching algorithm.
#[derive(Debug)]
pub struct LockController {
    registry: Mutex<ResourceRegistry>,
}

impl LockController {
    #[must_use]
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry: Mutex::new(registry),
        }
    }

    /// Discover resources from the configured directory
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the directory
    /// cannot be scanned, or it defines no resources.
    pub async fn from_config(config: &RouterConfig) -> Result<Self, Error> {
        config.validate()?;
        let resources = discover(
            &config.resource.directory,
            config.resource.max_concurrent_per_resource,
        )
        .await?;
        let registry = ResourceRegistry::new(resources)?;
        tracing::info!(
            directory = %config.resource.directory.display(),
            resources = registry.len(),
            "Lock controller ready"
        );
        Ok(Self::new(registry))
    }

    /// Run one matching attempt
    ///
    /// Scheduling outcomes, transient or not, come back as the result's
    /// status.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry or the queue group mutex is poisoned.
    pub fn try_acquire<T>(
        &self,
        group: &Mutex<EntityQueueGroup<T>>,
    ) -> Result<LockResult<T>, LockError> {
        let mut registry = self.registry("try_acquire")?;
        let mut queues = group.lock().map_err(|_| LockError::Poisoned {
            operation: "try_acquire".to_string(),
        })?;

        if queues.total_size() == 0 {
            tracing::error!("No entities queued for resources");
            return Ok(LockResult::status_only(LockStatus::NoTargetEntities));
        }

        let undefined = {
            let names: Vec<&str> = registry.keys().collect();
            queues
                .undefined_queues(&names)
                .first()
                .map(|queue| queue.key().clone())
        };
        if let Some(key) = undefined {
            if let Some(entity) = queues.pop(&key) {
                tracing::warn!(
                    required = %key,
                    remaining = queues.total_size(),
                    "Entity requires an undefined resource"
                );
                return Ok(LockResult::undefined_resource(entity));
            }
        }

        let available = registry.list_available();
        if available.is_empty() {
            tracing::debug!("No resource available");
            return Ok(LockResult::status_only(LockStatus::NoAvailable));
        }

        for resource in available {
            let Some(ticket) = queues.poll_ticket(resource.name()) else {
                continue;
            };
            let exclusive = ticket.entity().is_exclusive();
            let locked = if exclusive {
                registry.try_hard_lock(resource.name())?
            } else {
                registry.try_lock(resource.name())?
            };

            if locked {
                tracing::info!(
                    resource = %resource,
                    priority = %ticket.priority(),
                    exclusive,
                    "Resource granted"
                );
                return Ok(LockResult::locked(resource, ticket.into_entity(), exclusive));
            }

            tracing::trace!(resource = %resource, exclusive, "Lock lost, entity restored");
            queues.restore(ticket);
        }

        tracing::debug!("No queued entity fits the available resources");
        Ok(LockResult::status_only(LockStatus::NoEntityForAvailableEnvs))
    }

    /// Retry matching attempts until one ends the wait or the timeout runs out
    ///
    /// The first attempt runs immediately. Between attempts the task sleeps
    /// for the poll interval, cut short at the deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if the poll interval is zero or a mutex is poisoned.
    pub async fn acquire<T: Display>(
        &self,
        group: &Mutex<EntityQueueGroup<T>>,
        wait: WaitOptions,
    ) -> Result<LockResult<T>, LockError> {
        check_poll_interval(&wait)?;
        // A timeout past the clock's range waits without a deadline
        let deadline = tokio::time::Instant::now().checked_add(wait.timeout);

        loop {
            let result = self.try_acquire(group)?;
            if !result.status().is_transient() {
                return Ok(result);
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        return self.timed_out(group, wait.timeout);
                    }
                    wait.poll_interval.min(deadline - now)
                }
                None => wait.poll_interval,
            };
            tracing::debug!(status = %result.status(), "Waiting for a resource");
            tokio::time::sleep(pause).await;
        }
    }

    /// Blocking form of [`acquire`](Self::acquire) for thread-per-worker hosts
    ///
    /// # Errors
    ///
    /// Returns an error if the poll interval is zero or a mutex is poisoned.
    pub fn acquire_blocking<T: Display>(
        &self,
        group: &Mutex<EntityQueueGroup<T>>,
        wait: WaitOptions,
    ) -> Result<LockResult<T>, LockError> {
        check_poll_interval(&wait)?;
        // A timeout past the clock's range waits without a deadline
        let deadline = std::time::Instant::now().checked_add(wait.timeout);

        loop {
            let result = self.try_acquire(group)?;
            if !result.status().is_transient() {
                return Ok(result);
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = std::time::Instant::now();
                    if now >= deadline {
                        return self.timed_out(group, wait.timeout);
                    }
                    wait.poll_interval.min(deadline - now)
                }
                None => wait.poll_interval,
            };
            tracing::debug!(status = %result.status(), "Waiting for a resource");
            std::thread::sleep(pause);
        }
    }

    /// Whether the resource can take one more shared lock
    ///
    /// # Errors
    ///
    /// Returns an error if the registry mutex is poisoned.
    pub fn is_available(&self, name: &str) -> Result<bool, LockError> {
        Ok(self.registry("is_available")?.is_available(name))
    }

    /// # Errors
    ///
    /// Returns an error if the registry mutex is poisoned.
    pub fn list_available(&self) -> Result<Vec<Arc<Resource>>, LockError> {
        Ok(self.registry("list_available")?.list_available())
    }

    /// # Errors
    ///
    /// Returns an error if the registry mutex is poisoned.
    pub fn get(&self, name: &str) -> Result<Option<Arc<Resource>>, LockError> {
        Ok(self.registry("get")?.get(name).cloned())
    }

    /// Every resource, in name order
    ///
    /// # Errors
    ///
    /// Returns an error if the registry mutex is poisoned.
    pub fn resources(&self) -> Result<Vec<Arc<Resource>>, LockError> {
        Ok(self.registry("resources")?.resources().cloned().collect())
    }

    /// # Errors
    ///
    /// Returns an error if the registry mutex is poisoned.
    pub fn state(&self, name: &str) -> Result<Option<SlotState>, LockError> {
        Ok(self.registry("state")?.state(name))
    }

    /// # Errors
    ///
    /// Returns an error if the resource is unknown or the registry mutex is
    /// poisoned.
    pub fn try_lock(&self, name: &str) -> Result<bool, LockError> {
        self.registry("try_lock")?.try_lock(name)
    }

    /// # Errors
    ///
    /// Returns an error if the resource is unknown or the registry mutex is
    /// poisoned.
    pub fn try_hard_lock(&self, name: &str) -> Result<bool, LockError> {
        self.registry("try_hard_lock")?.try_hard_lock(name)
    }

    /// Give back one lock taken on the resource
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is unknown or the registry mutex is
    /// poisoned.
    pub fn release(&self, name: &str) -> Result<(), LockError> {
        self.registry("release")?.release(name)
    }

    /// # Errors
    ///
    /// Returns an error if the resource is unknown or the registry mutex is
    /// poisoned.
    pub fn reset(&self, name: &str) -> Result<(), LockError> {
        self.registry("reset")?.reset(name)
    }

    /// # Errors
    ///
    /// Returns an error if the registry mutex is poisoned.
    pub fn reset_all(&self) -> Result<(), LockError> {
        self.registry("reset_all")?.reset_all();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the registry mutex is poisoned.
    pub fn release_all(&self) -> Result<(), LockError> {
        self.registry("release_all")?.release_all();
        Ok(())
    }

    fn registry(&self, operation: &str) -> Result<MutexGuard<'_, ResourceRegistry>, LockError> {
        self.registry.lock().map_err(|_| LockError::Poisoned {
            operation: operation.to_string(),
        })
    }

    fn timed_out<T: Display>(
        &self,
        group: &Mutex<EntityQueueGroup<T>>,
        timeout: Duration,
    ) -> Result<LockResult<T>, LockError> {
        // Same order as a matching attempt
        let _registry = self.registry("acquire")?;
        let queues = group.lock().map_err(|_| LockError::Poisoned {
            operation: "acquire".to_string(),
        })?;

        let message = timeout_message(timeout, &queues);
        tracing::error!(
            timeout_ms = %timeout.as_millis(),
            pending = queues.total_size(),
            "Timed out waiting for a resource"
        );
        Ok(LockResult::timeout(message))
    }
}

fn check_poll_interval(wait: &WaitOptions) -> Result<(), LockError> {
    if wait.poll_interval.is_zero() {
        return Err(LockError::InvalidArgument {
            message: "poll interval must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn timeout_message<T: Display>(timeout: Duration, queues: &EntityQueueGroup<T>) -> String {
    let mut message = format!(
        "Routing timeout occurred ({} ms). Pending entities:",
        timeout.as_millis()
    );
    for entity in queues.pending() {
        // Writing to a String cannot fail
        let _ = write!(message, "\n{entity}");
    }
    message
}

impl Display for LockController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.registry.lock() {
            Ok(registry) => {
                let names: Vec<&str> = registry.resources().map(|r| r.name()).collect();
                write!(f, "LockController[{}]", names.join(", "))
            }
            Err(_) => write!(f, "LockController[poisoned]"),
        }
    }
}
