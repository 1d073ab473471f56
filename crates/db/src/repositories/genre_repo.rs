//! Repository for the `genres` table.

use marquee_core::pagination::{Page, PageRequest};
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::models::genre::{Genre, GenreInput};

/// Column list for `genres` queries.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides CRUD operations for genres.
pub struct GenreRepo;

impl GenreRepo {
    /// Insert a new genre, returning the created row.
    pub async fn create(pool: &PgPool, input: &GenreInput) -> Result<Genre, sqlx::Error> {
        let query = format!("INSERT INTO genres (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Genre>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a genre by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres WHERE id = $1");
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of genres ordered by name, with the total row count.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Page<Genre>, sqlx::Error> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(pool)
            .await?;
        let query = format!(
            "SELECT {COLUMNS} FROM genres ORDER BY name, id LIMIT $1 OFFSET $2"
        );
        let items = sqlx::query_as::<_, Genre>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;
        Ok(Page { items, total_count })
    }

    /// Every genre ordered by name.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Genre>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM genres ORDER BY name, id");
        sqlx::query_as::<_, Genre>(&query).fetch_all(pool).await
    }

    /// Every genre whose ID is not in `ids`, ordered by name.
    pub async fn list_excluding(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Genre>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM genres WHERE NOT (id = ANY($1)) ORDER BY name, id"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Rename a genre. Returns `None` if no genre with the given ID exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &GenreInput,
    ) -> Result<Option<Genre>, sqlx::Error> {
        let query = format!(
            "UPDATE genres SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(id)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a genre. Its `movie_genres` rows go with it (cascade).
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
