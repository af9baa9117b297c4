//! ReelGraph Core — shared errors and node-identifier utilities.
//!
//! This crate provides the foundational types used across all ReelGraph
//! crates. It has no internal ReelGraph dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`ids`]: Node-identifier scheme (`U<n>`, `M<n>`, `G<n>`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod error;
pub mod ids;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
