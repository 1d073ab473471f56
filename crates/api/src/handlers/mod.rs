//! Axum handlers, one module per resource.

pub mod actors;
pub mod cinemas;
pub mod genres;
pub mod movies;
