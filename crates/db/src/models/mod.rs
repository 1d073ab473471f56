//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` input DTO shared by create and update, with an explicit
//!   `validate` function composed from `marquee_core::validation` rules

pub mod actor;
pub mod cinema;
pub mod genre;
pub mod movie;
