//! Database models for loglens.
//!
//! - [`log_entry`] - log rows, filtered queries and month aggregates
//! - [`attribute`] - typed attribute values and their stored encoding
//! - [`severity`] - severity names and ranks

pub mod attribute;
pub mod log_entry;
pub mod severity;
