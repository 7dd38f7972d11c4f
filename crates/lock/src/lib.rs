#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Resource lock controller for envroute
//!
//! The controller matches queued entities to free resources. Every
//! matching attempt runs inside one critical section covering the slot
//! counters and the queue group, so concurrent callers never
//! over-subscribe a resource. Work that holds a granted resource runs
//! outside that section, under a [`Lease`] that gives the resource back
//! when dropped.

pub mod controller;
pub mod harness;

pub use controller::LockController;
pub use harness::{run_next, run_next_blocking, ExecutionContext, Lease};

pub use envroute_queue::{EntityQueueGroup, SharedQueueGroup};
pub use envroute_types::{Entity, LockResult, LockStatus, RequiredResource, Resource, WaitOptions};
