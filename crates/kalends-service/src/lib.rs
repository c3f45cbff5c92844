//! Appointment series aggregate: mutation orchestration, conflict
//! detection and range expansion over a [`kalends_store::store::SeriesStore`].

pub mod appointment;
pub mod conflict;
pub mod error;
pub mod expand;
