//! [`CatalogStore`] backed by PostgreSQL.
//!
//! Reads go straight to the repositories. Writes run as whole transactions
//! under the retry policy, so a serialization failure or dropped connection
//! re-runs the complete unit instead of leaving half of it applied.
//! Inserts are only retried when the database reported that nothing was
//! committed.

use async_trait::async_trait;
use chrono::NaiveDate;
use marquee_core::error::CoreError;
use marquee_core::pagination::{Page, PageRequest};
use marquee_core::reconcile::{CurrentRelations, DesiredRelations, RelationshipDelta};
use marquee_core::retry::{with_retry, RetryPolicy};
use marquee_core::types::DbId;

use crate::error::{db_error, db_insert_error};
use crate::models::actor::{Actor, ActorInput};
use crate::models::cinema::{Cinema, CinemaInput};
use crate::models::genre::{Genre, GenreInput};
use crate::models::movie::{Movie, MovieDetail, MovieInput};
use crate::repositories::movie_repo::DeltaOutcome;
use crate::repositories::{ActorRepo, CinemaRepo, GenreRepo, MovieRepo};
use crate::store::{CatalogStore, StoreResult, Updated};
use crate::DbPool;

pub struct PgCatalogStore {
    pool: DbPool,
    retry: RetryPolicy,
}

impl PgCatalogStore {
    pub fn new(pool: DbPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await.map_err(db_error)
    }

    // -- genres -------------------------------------------------------------

    async fn create_genre(&self, input: &GenreInput) -> StoreResult<Genre> {
        let pool = &self.pool;
        with_retry(&self.retry, "create_genre", move || async move {
            GenreRepo::create(pool, input).await.map_err(db_insert_error)
        })
        .await
    }

    async fn find_genre(&self, id: DbId) -> StoreResult<Option<Genre>> {
        GenreRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn list_genres(&self, page: PageRequest) -> StoreResult<Page<Genre>> {
        GenreRepo::list(&self.pool, page).await.map_err(db_error)
    }

    async fn all_genres(&self) -> StoreResult<Vec<Genre>> {
        GenreRepo::list_all(&self.pool).await.map_err(db_error)
    }

    async fn genres_excluding(&self, ids: &[DbId]) -> StoreResult<Vec<Genre>> {
        GenreRepo::list_excluding(&self.pool, ids).await.map_err(db_error)
    }

    async fn update_genre(&self, id: DbId, input: &GenreInput) -> StoreResult<Option<Genre>> {
        let pool = &self.pool;
        with_retry(&self.retry, "update_genre", move || async move {
            GenreRepo::update(pool, id, input).await.map_err(db_error)
        })
        .await
    }

    async fn delete_genre(&self, id: DbId) -> StoreResult<bool> {
        let pool = &self.pool;
        with_retry(&self.retry, "delete_genre", move || async move {
            GenreRepo::delete(pool, id).await.map_err(db_error)
        })
        .await
    }

    // -- cinemas ------------------------------------------------------------

    async fn create_cinema(&self, input: &CinemaInput) -> StoreResult<Cinema> {
        let pool = &self.pool;
        with_retry(&self.retry, "create_cinema", move || async move {
            CinemaRepo::create(pool, input).await.map_err(db_insert_error)
        })
        .await
    }

    async fn find_cinema(&self, id: DbId) -> StoreResult<Option<Cinema>> {
        CinemaRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn list_cinemas(&self, page: PageRequest) -> StoreResult<Page<Cinema>> {
        CinemaRepo::list(&self.pool, page).await.map_err(db_error)
    }

    async fn all_cinemas(&self) -> StoreResult<Vec<Cinema>> {
        CinemaRepo::list_all(&self.pool).await.map_err(db_error)
    }

    async fn cinemas_excluding(&self, ids: &[DbId]) -> StoreResult<Vec<Cinema>> {
        CinemaRepo::list_excluding(&self.pool, ids).await.map_err(db_error)
    }

    async fn update_cinema(&self, id: DbId, input: &CinemaInput) -> StoreResult<Option<Cinema>> {
        let pool = &self.pool;
        with_retry(&self.retry, "update_cinema", move || async move {
            CinemaRepo::update(pool, id, input).await.map_err(db_error)
        })
        .await
    }

    async fn delete_cinema(&self, id: DbId) -> StoreResult<bool> {
        let pool = &self.pool;
        with_retry(&self.retry, "delete_cinema", move || async move {
            CinemaRepo::delete(pool, id).await.map_err(db_error)
        })
        .await
    }

    // -- actors -------------------------------------------------------------

    async fn create_actor(&self, input: &ActorInput) -> StoreResult<Actor> {
        let pool = &self.pool;
        with_retry(&self.retry, "create_actor", move || async move {
            ActorRepo::create(pool, input).await.map_err(db_insert_error)
        })
        .await
    }

    async fn find_actor(&self, id: DbId) -> StoreResult<Option<Actor>> {
        ActorRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn list_actors(&self, page: PageRequest) -> StoreResult<Page<Actor>> {
        ActorRepo::list(&self.pool, page).await.map_err(db_error)
    }

    async fn update_actor(
        &self,
        id: DbId,
        input: &ActorInput,
    ) -> StoreResult<Option<Updated<Actor>>> {
        let pool = &self.pool;
        with_retry(&self.retry, "update_actor", move || async move {
            ActorRepo::update(pool, id, input).await.map_err(db_error)
        })
        .await
    }

    async fn delete_actor(&self, id: DbId) -> StoreResult<bool> {
        let pool = &self.pool;
        with_retry(&self.retry, "delete_actor", move || async move {
            ActorRepo::delete(pool, id).await.map_err(db_error)
        })
        .await
    }

    // -- movies -------------------------------------------------------------

    async fn create_movie(
        &self,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> StoreResult<Movie> {
        let pool = &self.pool;
        with_retry(&self.retry, "create_movie", move || async move {
            MovieRepo::create(pool, input, relations)
                .await
                .map_err(db_insert_error)
        })
        .await
    }

    async fn find_movie(&self, id: DbId) -> StoreResult<Option<Movie>> {
        MovieRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn find_movie_detail(&self, id: DbId) -> StoreResult<Option<MovieDetail>> {
        MovieRepo::find_detail(&self.pool, id).await.map_err(db_error)
    }

    async fn movie_relations(&self, id: DbId) -> StoreResult<Option<CurrentRelations>> {
        MovieRepo::relations(&self.pool, id).await.map_err(db_error)
    }

    async fn list_movies(&self, page: PageRequest) -> StoreResult<Page<Movie>> {
        MovieRepo::list(&self.pool, page).await.map_err(db_error)
    }

    async fn upcoming_releases(&self, after: NaiveDate, limit: i64) -> StoreResult<Vec<Movie>> {
        MovieRepo::list_upcoming(&self.pool, after, limit)
            .await
            .map_err(db_error)
    }

    async fn movies_in_theaters(&self, limit: i64) -> StoreResult<Vec<Movie>> {
        MovieRepo::list_in_theaters(&self.pool, limit)
            .await
            .map_err(db_error)
    }

    async fn update_movie(
        &self,
        id: DbId,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> StoreResult<Option<Updated<Movie>>> {
        let pool = &self.pool;
        with_retry(&self.retry, "update_movie", move || async move {
            MovieRepo::update(pool, id, input, relations)
                .await
                .map_err(db_error)
        })
        .await
    }

    async fn apply_relationship_delta(&self, delta: &RelationshipDelta) -> StoreResult<()> {
        let pool = &self.pool;
        let outcome = with_retry(&self.retry, "apply_relationship_delta", move || async move {
            MovieRepo::apply_delta(pool, delta).await.map_err(db_error)
        })
        .await?;

        match outcome {
            DeltaOutcome::Applied => Ok(()),
            DeltaOutcome::MovieMissing => Err(CoreError::NotFound {
                entity: "Movie",
                id: delta.movie_id,
            }),
            DeltaOutcome::Stale => Err(CoreError::Conflict(format!(
                "Relations of movie {} changed since they were read",
                delta.movie_id
            ))),
        }
    }

    async fn delete_movie(&self, id: DbId) -> StoreResult<bool> {
        let pool = &self.pool;
        with_retry(&self.retry, "delete_movie", move || async move {
            MovieRepo::delete(pool, id).await.map_err(db_error)
        })
        .await
    }
}
