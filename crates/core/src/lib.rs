//! Domain logic for the Marquee catalog: pagination, movie-aggregate
//! reconciliation, field validation, the blob storage port and retry policy.
//!
//! This crate performs no database or network I/O of its own.

pub mod blob;
pub mod error;
pub mod pagination;
pub mod reconcile;
pub mod retry;
pub mod types;
pub mod validation;
