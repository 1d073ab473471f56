//! Repository for the `cinemas` table.

use marquee_core::pagination::{Page, PageRequest};
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::models::cinema::{Cinema, CinemaInput};

/// Column list for `cinemas` queries.
const COLUMNS: &str = "id, name, latitude, longitude, created_at, updated_at";

/// Provides CRUD operations for cinemas.
pub struct CinemaRepo;

impl CinemaRepo {
    /// Insert a new cinema, returning the created row.
    pub async fn create(pool: &PgPool, input: &CinemaInput) -> Result<Cinema, sqlx::Error> {
        let query = format!(
            "INSERT INTO cinemas (name, latitude, longitude) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cinema>(&query)
            .bind(&input.name)
            .bind(input.location.map(|p| p.latitude))
            .bind(input.location.map(|p| p.longitude))
            .fetch_one(pool)
            .await
    }

    /// Find a cinema by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Cinema>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cinemas WHERE id = $1");
        sqlx::query_as::<_, Cinema>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of cinemas ordered by name, with the total row count.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Page<Cinema>, sqlx::Error> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cinemas")
            .fetch_one(pool)
            .await?;
        let query = format!(
            "SELECT {COLUMNS} FROM cinemas ORDER BY name, id LIMIT $1 OFFSET $2"
        );
        let items = sqlx::query_as::<_, Cinema>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;
        Ok(Page { items, total_count })
    }

    /// Every cinema ordered by name.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Cinema>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cinemas ORDER BY name, id");
        sqlx::query_as::<_, Cinema>(&query).fetch_all(pool).await
    }

    /// Every cinema whose ID is not in `ids`, ordered by name.
    pub async fn list_excluding(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Cinema>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cinemas WHERE NOT (id = ANY($1)) ORDER BY name, id"
        );
        sqlx::query_as::<_, Cinema>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Overwrite name and location. A missing location clears both coordinates.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CinemaInput,
    ) -> Result<Option<Cinema>, sqlx::Error> {
        let query = format!(
            "UPDATE cinemas SET name = $2, latitude = $3, longitude = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cinema>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.location.map(|p| p.latitude))
            .bind(input.location.map(|p| p.longitude))
            .fetch_optional(pool)
            .await
    }

    /// Delete a cinema. Its `movie_cinemas` rows go with it (cascade).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cinemas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
