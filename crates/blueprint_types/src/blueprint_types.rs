//! Blueprint Types - Core type definitions for blueprint nodes
//!
//! This crate contains the pure data structures shared by the node registry,
//! the node implementations and any graph host: pin and node descriptors,
//! latent wake conditions, log verbosity levels and colors.

mod color;
mod types;
mod verbosity;

pub use color::*;
pub use types::*;
pub use verbosity::*;
