#![deny(clippy::pedantic, unsafe_code)]

//! Resource management for envroute
//!
//! This crate owns the fixed set of named resources and their slot
//! counters, and discovers that set from a directory of configuration
//! files.

pub mod discovery;
pub mod registry;

pub use discovery::discover;
pub use registry::{ResourceRegistry, SlotState};
