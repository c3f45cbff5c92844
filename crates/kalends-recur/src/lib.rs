//! Recurrence engine for appointment series.
//!
//! Expands a series master plus its recurrence rule into ordered, finite
//! occurrence sequences, honoring timezone wall-clock semantics, DST gap
//! policy, terminators (until/count), and per-occurrence exceptions.

pub mod error;
pub mod exception;
pub mod generator;
pub mod model;
pub mod rule;
pub mod timezone;
