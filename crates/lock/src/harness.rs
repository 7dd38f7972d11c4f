//! Running entities on granted resources
//!
//! A [`Lease`] owns one granted lock and gives it back when dropped, also
//! while unwinding. The unit of work receives the resource it runs on as an
//! explicit [`ExecutionContext`].

use crate::controller::LockController;
use envroute_errors::LockError;
use envroute_queue::EntityQueueGroup;
use envroute_types::{Entity, LockResult, LockStatus, Resource, WaitOptions};
use std::fmt::Display;
use std::sync::{Arc, Mutex};

/// What a unit of work needs to know about its grant
#[derive(Debug, Clone)]
pub struct ExecutionContext<T> {
    pub resource: Arc<Resource>,
    pub entity: Entity<T>,
    /// `SuccessLocked` or `SuccessHardLocked`
    pub status: LockStatus,
}

impl<T> ExecutionContext<T> {
    pub fn is_exclusive(&self) -> bool {
        self.status == LockStatus::SuccessHardLocked
    }
}

/// Scoped ownership of a granted resource
#[derive(Debug)]
#[must_use = "dropping a lease releases its resource"]
pub struct Lease<'a, T> {
    controller: &'a LockController,
    context: ExecutionContext<T>,
    released: bool,
}

impl<T> Lease<'_, T> {
    pub fn context(&self) -> &ExecutionContext<T> {
        &self.context
    }

    pub fn resource(&self) -> &Arc<Resource> {
        &self.context.resource
    }

    pub fn entity(&self) -> &Entity<T> {
        &self.context.entity
    }

    /// Release now and report the outcome instead of logging it
    ///
    /// # Errors
    ///
    /// Returns an error if the controller cannot release the resource.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.controller.release(self.context.resource.name())
    }
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.controller.release(self.context.resource.name()) {
            tracing::error!(
                resource = %self.context.resource,
                error = %e,
                "Failed to release leased resource"
            );
        }
    }
}

impl LockController {
    /// Take ownership of a successful result's lock
    ///
    /// # Errors
    ///
    /// Hands back any result that did not grant a resource.
    pub fn lease<T>(&self, result: LockResult<T>) -> Result<Lease<'_, T>, LockResult<T>> {
        let status = result.status();
        let (resource, entity) = result.into_grant()?;
        Ok(Lease {
            controller: self,
            context: ExecutionContext {
                resource,
                entity,
                status,
            },
            released: false,
        })
    }
}

/// Acquire the next entity and run it on its resource
///
/// On success `run` gets the execution context and the lock is released
/// when it returns or panics. Any other result goes to `on_failure`.
///
/// # Errors
///
/// Returns an error if acquiring fails with a [`LockError`].
pub async fn run_next<T, R>(
    controller: &LockController,
    group: &Mutex<EntityQueueGroup<T>>,
    wait: WaitOptions,
    run: impl AsyncFnOnce(&ExecutionContext<T>) -> R,
    on_failure: impl FnOnce(LockResult<T>) -> R,
) -> Result<R, LockError>
where
    T: Display,
{
    let result = controller.acquire(group, wait).await?;
    match controller.lease(result) {
        Ok(lease) => {
            tracing::debug!(resource = %lease.resource(), entity = %lease.entity(), "Running entity");
            Ok(run(lease.context()).await)
        }
        Err(result) => Ok(on_failure(result)),
    }
}

/// Blocking form of [`run_next`]
///
/// # Errors
///
/// Returns an error if acquiring fails with a [`LockError`].
pub fn run_next_blocking<T, R>(
    controller: &LockController,
    group: &Mutex<EntityQueueGroup<T>>,
    wait: WaitOptions,
    run: impl FnOnce(&ExecutionContext<T>) -> R,
    on_failure: impl FnOnce(LockResult<T>) -> R,
) -> Result<R, LockError>
where
    T: Display,
{
    let result = controller.acquire_blocking(group, wait)?;
    match controller.lease(result) {
        Ok(lease) => {
            tracing::debug!(resource = %lease.resource(), entity = %lease.entity(), "Running entity");
            Ok(run(lease.context()))
        }
        Err(result) => Ok(on_failure(result)),
    }
}
