#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Priority queues of entities waiting for a resource
//!
//! A queue group holds one min-priority queue per required resource name
//! plus one for the wildcard. Equal priorities are served in insertion
//! order.

pub mod group;
pub mod ticket;

pub use group::{EntityQueueGroup, QueueRef, SharedQueueGroup};
pub use ticket::Ticket;
