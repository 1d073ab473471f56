//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async SQL operations
//! that accept `&PgPool` as the first argument. Operations that must share a
//! transaction with other repositories take a `Transaction` instead and carry
//! an `_inner` suffix.

pub mod actor_repo;
pub mod cinema_repo;
pub mod genre_repo;
pub mod movie_repo;

pub use actor_repo::ActorRepo;
pub use cinema_repo::CinemaRepo;
pub use genre_repo::GenreRepo;
pub use movie_repo::MovieRepo;

/// Postgres transaction handle used by the `_inner` helpers.
pub type PgTx<'c> = sqlx::Transaction<'c, sqlx::Postgres>;
