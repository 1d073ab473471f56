//! Repository for the `movies` table and its join tables
//! (`movie_genres`, `movie_cinemas`, `movie_actors`).

use chrono::NaiveDate;
use marquee_core::pagination::{Page, PageRequest};
use marquee_core::reconcile::{
    reconcile, CurrentRelations, DesiredRelations, JoinOp, JoinRow, RelationshipDelta, RoleRow,
};
use marquee_core::types::DbId;
use sqlx::PgPool;

use super::PgTx;
use crate::models::cinema::Cinema;
use crate::models::genre::Genre;
use crate::models::movie::{CastMember, Movie, MovieDetail, MovieInput};
use crate::store::Updated;

/// Column list for the `movies` table.
const COLUMNS: &str = "id, title, summary, release_date, in_theaters, poster_url, \
    created_at, updated_at";

/// Column list for `genres` in JOIN queries.
const GENRE_COLUMNS: &str = "g.id, g.name, g.created_at, g.updated_at";

/// Column list for `cinemas` in JOIN queries.
const CINEMA_COLUMNS: &str =
    "c.id, c.name, c.latitude, c.longitude, c.created_at, c.updated_at";

/// Result of [`MovieRepo::apply_delta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    Applied,
    MovieMissing,
    /// The delta was computed from join rows that have changed since.
    Stale,
}

/// Provides movie CRUD plus the relationship-aware reads and writes.
pub struct MovieRepo;

impl MovieRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a movie together with its initial join rows.
    ///
    /// The join rows are the reconciliation of `relations` against an empty
    /// state, applied in the same transaction as the insert.
    pub async fn create(
        pool: &PgPool,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> Result<Movie, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO movies (title, summary, release_date, in_theaters, poster_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(&input.title)
            .bind(&input.summary)
            .bind(input.release_date)
            .bind(input.in_theaters)
            .bind(&input.poster_url)
            .fetch_one(&mut *tx)
            .await?;

        let delta = reconcile(movie.id, &CurrentRelations::default(), relations);
        Self::apply_delta_inner(&mut tx, &delta).await?;

        tx.commit().await?;
        Ok(movie)
    }

    /// Overwrite a movie's scalars and reconcile its join rows towards
    /// `relations` atomically.
    ///
    /// The movie row is locked before the current join rows are read, so
    /// concurrent updates of one movie run one after the other. A `None`
    /// poster keeps the stored one. Returns `None` (and applies nothing) if
    /// the movie does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> Result<Option<Updated<Movie>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(previous_url) = Self::lock_inner(&mut tx, id).await? else {
            return Ok(None);
        };
        let current = Self::relations_inner(&mut tx, id).await?;
        let delta = reconcile(id, &current, relations);

        let query = format!(
            "UPDATE movies SET \
                title = $2, \
                summary = $3, \
                release_date = $4, \
                in_theaters = $5, \
                poster_url = COALESCE($6, poster_url), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let movie = sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.summary)
            .bind(input.release_date)
            .bind(input.in_theaters)
            .bind(&input.poster_url)
            .fetch_one(&mut *tx)
            .await?;

        Self::apply_delta_inner(&mut tx, &delta).await?;
        tx.commit().await?;
        Ok(Some(Updated::new(
            movie,
            previous_url,
            input.poster_url.as_deref(),
        )))
    }

    /// Apply a delta in its own transaction.
    ///
    /// The delta is only applied when its deletes still match the persisted
    /// join rows; see [`RelationshipDelta::deletes_match`].
    pub async fn apply_delta(
        pool: &PgPool,
        delta: &RelationshipDelta,
    ) -> Result<DeltaOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if Self::lock_inner(&mut tx, delta.movie_id).await?.is_none() {
            return Ok(DeltaOutcome::MovieMissing);
        }
        let current = Self::relations_inner(&mut tx, delta.movie_id).await?;
        if !delta.deletes_match(&current) {
            return Ok(DeltaOutcome::Stale);
        }

        Self::apply_delta_inner(&mut tx, delta).await?;
        tx.commit().await?;
        Ok(DeltaOutcome::Applied)
    }

    /// Delete a movie and all of its join rows.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        for table in ["movie_genres", "movie_cinemas", "movie_actors"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE movie_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a movie by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Movie>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a movie enriched with its genres, cinemas and cast.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<MovieDetail>, sqlx::Error> {
        let Some(movie) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let genres = Self::genres_for_movie(pool, id).await?;
        let cinemas = Self::cinemas_for_movie(pool, id).await?;
        let cast = Self::cast_for_movie(pool, id).await?;
        Ok(Some(MovieDetail {
            movie,
            genres,
            cinemas,
            cast,
        }))
    }

    /// The persisted join rows of a movie, `None` if the movie is absent.
    pub async fn relations(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CurrentRelations>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let exists: Option<DbId> = sqlx::query_scalar("SELECT id FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }
        let relations = Self::relations_inner(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(relations))
    }

    /// One page of movies ordered by title, with the total row count.
    pub async fn list(pool: &PgPool, page: PageRequest) -> Result<Page<Movie>, sqlx::Error> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(pool)
            .await?;
        let query = format!(
            "SELECT {COLUMNS} FROM movies ORDER BY title, id LIMIT $1 OFFSET $2"
        );
        let items = sqlx::query_as::<_, Movie>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;
        Ok(Page { items, total_count })
    }

    /// Movies released strictly after `after`, soonest first.
    pub async fn list_upcoming(
        pool: &PgPool,
        after: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Movie>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM movies WHERE release_date > $1 \
             ORDER BY release_date, id LIMIT $2"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(after)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Movies in theaters by ascending release date.
    pub async fn list_in_theaters(pool: &PgPool, limit: i64) -> Result<Vec<Movie>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM movies WHERE in_theaters \
             ORDER BY release_date, id LIMIT $1"
        );
        sqlx::query_as::<_, Movie>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    async fn genres_for_movie(pool: &PgPool, movie_id: DbId) -> Result<Vec<Genre>, sqlx::Error> {
        let query = format!(
            "SELECT {GENRE_COLUMNS} FROM genres g \
             JOIN movie_genres mg ON mg.genre_id = g.id \
             WHERE mg.movie_id = $1 \
             ORDER BY g.name, g.id"
        );
        sqlx::query_as::<_, Genre>(&query)
            .bind(movie_id)
            .fetch_all(pool)
            .await
    }

    async fn cinemas_for_movie(pool: &PgPool, movie_id: DbId) -> Result<Vec<Cinema>, sqlx::Error> {
        let query = format!(
            "SELECT {CINEMA_COLUMNS} FROM cinemas c \
             JOIN movie_cinemas mc ON mc.cinema_id = c.id \
             WHERE mc.movie_id = $1 \
             ORDER BY c.name, c.id"
        );
        sqlx::query_as::<_, Cinema>(&query)
            .bind(movie_id)
            .fetch_all(pool)
            .await
    }

    async fn cast_for_movie(pool: &PgPool, movie_id: DbId) -> Result<Vec<CastMember>, sqlx::Error> {
        sqlx::query_as::<_, CastMember>(
            "SELECT ma.actor_id, a.name, a.photo_url, ma.character_name, ma.sort_order AS \"order\" \
             FROM movie_actors ma \
             JOIN actors a ON a.id = ma.actor_id \
             WHERE ma.movie_id = $1 \
             ORDER BY ma.sort_order",
        )
        .bind(movie_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Lock the movie row for the rest of `tx` and return its poster URL.
    /// The outer `None` means the movie does not exist.
    async fn lock_inner(
        tx: &mut PgTx<'_>,
        id: DbId,
    ) -> Result<Option<Option<String>>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT poster_url FROM movies WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    async fn relations_inner(
        tx: &mut PgTx<'_>,
        id: DbId,
    ) -> Result<CurrentRelations, sqlx::Error> {
        let genre_ids: Vec<DbId> = sqlx::query_scalar(
            "SELECT genre_id FROM movie_genres WHERE movie_id = $1 ORDER BY genre_id",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?;
        let cinema_ids: Vec<DbId> = sqlx::query_scalar(
            "SELECT cinema_id FROM movie_cinemas WHERE movie_id = $1 ORDER BY cinema_id",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?;
        let roster = sqlx::query_as::<_, (DbId, String, i32)>(
            "SELECT actor_id, character_name, sort_order FROM movie_actors \
             WHERE movie_id = $1 ORDER BY sort_order",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .map(|(actor_id, character_name, order)| RoleRow {
            actor_id,
            character_name,
            order,
        })
        .collect();

        Ok(CurrentRelations {
            genre_ids,
            cinema_ids,
            roster,
        })
    }

    /// Execute every operation of `delta` in order within `tx`.
    pub(crate) async fn apply_delta_inner(
        tx: &mut PgTx<'_>,
        delta: &RelationshipDelta,
    ) -> Result<(), sqlx::Error> {
        let movie_id = delta.movie_id;
        let mut roster_cleared = false;
        for op in &delta.ops {
            match op {
                JoinOp::Delete(JoinRow::Genre { genre_id }) => {
                    sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1 AND genre_id = $2")
                        .bind(movie_id)
                        .bind(genre_id)
                        .execute(&mut **tx)
                        .await?;
                }
                JoinOp::Delete(JoinRow::Cinema { cinema_id }) => {
                    sqlx::query("DELETE FROM movie_cinemas WHERE movie_id = $1 AND cinema_id = $2")
                        .bind(movie_id)
                        .bind(cinema_id)
                        .execute(&mut **tx)
                        .await?;
                }
                // The roster is replaced as a whole.
                JoinOp::Delete(JoinRow::Role { .. }) if roster_cleared => {}
                JoinOp::Delete(JoinRow::Role { .. }) => {
                    sqlx::query("DELETE FROM movie_actors WHERE movie_id = $1")
                        .bind(movie_id)
                        .execute(&mut **tx)
                        .await?;
                    roster_cleared = true;
                }
                JoinOp::Insert(JoinRow::Genre { genre_id }) => {
                    sqlx::query("INSERT INTO movie_genres (movie_id, genre_id) VALUES ($1, $2)")
                        .bind(movie_id)
                        .bind(genre_id)
                        .execute(&mut **tx)
                        .await?;
                }
                JoinOp::Insert(JoinRow::Cinema { cinema_id }) => {
                    sqlx::query("INSERT INTO movie_cinemas (movie_id, cinema_id) VALUES ($1, $2)")
                        .bind(movie_id)
                        .bind(cinema_id)
                        .execute(&mut **tx)
                        .await?;
                }
                JoinOp::Insert(JoinRow::Role {
                    actor_id,
                    character_name,
                    order,
                }) => {
                    sqlx::query(
                        "INSERT INTO movie_actors (movie_id, actor_id, character_name, sort_order) \
                         VALUES ($1, $2, $3, $4)",
                    )
                    .bind(movie_id)
                    .bind(actor_id)
                    .bind(character_name)
                    .bind(order)
                    .execute(&mut **tx)
                    .await?;
                }
            }
        }
        tracing::debug!(
            movie_id,
            inserts = delta.inserts().count(),
            deletes = delta.deletes().count(),
            "Applied relationship delta",
        );
        Ok(())
    }

    /// Close gaps in the rosters of `movie_ids` so orders run `0..n-1`.
    ///
    /// Relies on the `movie_actors` key being checked at commit.
    pub(crate) async fn renumber_roles_inner(
        tx: &mut PgTx<'_>,
        movie_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE movie_actors ma SET sort_order = r.new_order \
             FROM ( \
                SELECT movie_id, sort_order, \
                       (ROW_NUMBER() OVER (PARTITION BY movie_id ORDER BY sort_order) - 1)::INTEGER \
                           AS new_order \
                FROM movie_actors \
                WHERE movie_id = ANY($1) \
             ) r \
             WHERE ma.movie_id = r.movie_id \
               AND ma.sort_order = r.sort_order \
               AND ma.sort_order <> r.new_order",
        )
        .bind(movie_ids)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
