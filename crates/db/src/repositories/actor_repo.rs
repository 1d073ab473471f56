//! Repository for the `actors` table.

use marquee_core::pagination::{Page, PageRequest};
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::models::actor::{Actor, ActorInput};
use crate::store::Updated;

use super::movie_repo::MovieRepo;

/// Column list for `actors` queries.
const COLUMNS: &str = "id, name, biography, birth_date, photo_url, created_at, updated_at";

/// Provides CRUD operations for actors.
pub struct ActorRepo;

impl ActorRepo {
    /// Insert a new actor, returning the created row.
    pub async fn create(pool: &PgPool, input: &ActorInput) -> Result<Actor, sqlx::Error> {
        let query = format!(
            "INSERT INTO actors (name, biography, birth_date, photo_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Actor>(&query)
            .bind(&input.name)
            .bind(&input.biography)
            .bind(input.birth_date)
            .bind(&input.photo_url)
            .fetch_one(pool)
            .await
    }

    /// Find an actor by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Actor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM actors WHERE id = $1");
        sqlx::query_as::<_, Actor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of actors ordered by name, with the total row count.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Page<Actor>, sqlx::Error> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actors")
            .fetch_one(pool)
            .await?;
        let query = format!(
            "SELECT {COLUMNS} FROM actors ORDER BY name, id LIMIT $1 OFFSET $2"
        );
        let items = sqlx::query_as::<_, Actor>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;
        Ok(Page { items, total_count })
    }

    /// Overwrite an actor. A `None` photo keeps the stored one.
    ///
    /// The previous photo URL is read under a row lock in the same
    /// transaction, so the reported superseded URL is the one this write
    /// replaced.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &ActorInput,
    ) -> Result<Option<Updated<Actor>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let previous: Option<Option<String>> =
            sqlx::query_scalar("SELECT photo_url FROM actors WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(previous_url) = previous else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE actors SET \
                name = $2, \
                biography = $3, \
                birth_date = $4, \
                photo_url = COALESCE($5, photo_url), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let actor = sqlx::query_as::<_, Actor>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.biography)
            .bind(input.birth_date)
            .bind(&input.photo_url)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(Updated::new(
            actor,
            previous_url,
            input.photo_url.as_deref(),
        )))
    }

    /// Delete an actor and close the gaps it leaves in every roster.
    ///
    /// Role rows go with the actor (cascade); the affected rosters are then
    /// renumbered so their orders stay `0..n-1`.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let movie_ids: Vec<DbId> =
            sqlx::query_scalar("SELECT DISTINCT movie_id FROM movie_actors WHERE actor_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let result = sqlx::query("DELETE FROM actors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if !movie_ids.is_empty() {
            MovieRepo::renumber_roles_inner(&mut tx, &movie_ids).await?;
        }

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
