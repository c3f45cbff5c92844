//! Persisted-store interface for appointment series.
//!
//! Series records are keyed by series id and guarded by an optimistic
//! concurrency token (the last-modified timestamp). The in-memory
//! implementation is the reference store; a transactional backend can
//! implement the same trait.

pub mod error;
pub mod memory;
pub mod store;
