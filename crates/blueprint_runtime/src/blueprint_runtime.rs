//! Blueprint Runtime - Node registry and execution context
//!
//! This crate contains the node registry a plugin fills with its node types
//! and the context/output types node executors work with.

pub use blueprint_types;

mod executor;
mod registry;

pub use executor::*;
pub use registry::*;
