//! Shared primitives for the kalends calendar core.
//!
//! Error taxonomy, configuration, stable error codes, and the small value
//! types every other crate in the workspace speaks in.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
