#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for envroute
//!
//! This crate provides the data model shared by the registry, the queue
//! group and the lock controller: resources, entities waiting for a
//! resource, and the outcome of a matching attempt.

pub mod entity;
pub mod lock;
pub mod resource;

pub use entity::{Entity, Priority, RequiredResource, ANY_RESOURCE};
pub use lock::{LockResult, LockStatus, WaitOptions};
pub use resource::Resource;
