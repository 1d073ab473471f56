//! The catalog store port.
//!
//! Every handler in the API crate talks to persistence through
//! [`CatalogStore`]. Implementations must apply each movie write (scalars
//! plus its [`RelationshipDelta`]) as one atomic unit: either every join-row
//! mutation is visible afterwards or none is. The delta of an update is
//! computed inside that unit, from the join rows it is about to replace.

use async_trait::async_trait;
use chrono::NaiveDate;
use marquee_core::error::CoreError;
use marquee_core::pagination::{Page, PageRequest};
use marquee_core::reconcile::{CurrentRelations, DesiredRelations, RelationshipDelta};
use marquee_core::types::DbId;

use crate::models::actor::{Actor, ActorInput};
use crate::models::cinema::{Cinema, CinemaInput};
use crate::models::genre::{Genre, GenreInput};
use crate::models::movie::{Movie, MovieDetail, MovieInput};

pub type StoreResult<T> = Result<T, CoreError>;

/// Outcome of an update that may swap the record's image.
#[derive(Debug, Clone, PartialEq)]
pub struct Updated<T> {
    pub record: T,
    /// The image URL the record pointed at before the write, when the write
    /// replaced it with a different one.
    pub superseded_url: Option<String>,
}

impl<T> Updated<T> {
    /// Pair `record` with the URL that `new_url` replaced, if any.
    pub fn new(record: T, previous_url: Option<String>, new_url: Option<&str>) -> Self {
        let superseded_url = match new_url {
            Some(new_url) => previous_url.filter(|previous| previous != new_url),
            None => None,
        };
        Self {
            record,
            superseded_url,
        }
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Cheap liveness probe of the backing store.
    async fn ping(&self) -> StoreResult<()>;

    // -- genres -------------------------------------------------------------

    async fn create_genre(&self, input: &GenreInput) -> StoreResult<Genre>;
    async fn find_genre(&self, id: DbId) -> StoreResult<Option<Genre>>;
    /// Genres ordered by name.
    async fn list_genres(&self, page: PageRequest) -> StoreResult<Page<Genre>>;
    async fn all_genres(&self) -> StoreResult<Vec<Genre>>;
    /// Every genre whose id is not in `ids`, ordered by name.
    async fn genres_excluding(&self, ids: &[DbId]) -> StoreResult<Vec<Genre>>;
    async fn update_genre(&self, id: DbId, input: &GenreInput) -> StoreResult<Option<Genre>>;
    /// Returns `false` when no genre had this id.
    async fn delete_genre(&self, id: DbId) -> StoreResult<bool>;

    // -- cinemas ------------------------------------------------------------

    async fn create_cinema(&self, input: &CinemaInput) -> StoreResult<Cinema>;
    async fn find_cinema(&self, id: DbId) -> StoreResult<Option<Cinema>>;
    async fn list_cinemas(&self, page: PageRequest) -> StoreResult<Page<Cinema>>;
    async fn all_cinemas(&self) -> StoreResult<Vec<Cinema>>;
    async fn cinemas_excluding(&self, ids: &[DbId]) -> StoreResult<Vec<Cinema>>;
    async fn update_cinema(&self, id: DbId, input: &CinemaInput) -> StoreResult<Option<Cinema>>;
    async fn delete_cinema(&self, id: DbId) -> StoreResult<bool>;

    // -- actors -------------------------------------------------------------

    async fn create_actor(&self, input: &ActorInput) -> StoreResult<Actor>;
    async fn find_actor(&self, id: DbId) -> StoreResult<Option<Actor>>;
    async fn list_actors(&self, page: PageRequest) -> StoreResult<Page<Actor>>;
    /// A `None` photo in `input` keeps the stored photo.
    async fn update_actor(
        &self,
        id: DbId,
        input: &ActorInput,
    ) -> StoreResult<Option<Updated<Actor>>>;
    /// Also removes the actor's role rows and renumbers the affected rosters.
    async fn delete_actor(&self, id: DbId) -> StoreResult<bool>;

    // -- movies -------------------------------------------------------------

    /// Insert a movie and its initial join rows in one transaction.
    async fn create_movie(
        &self,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> StoreResult<Movie>;
    async fn find_movie(&self, id: DbId) -> StoreResult<Option<Movie>>;
    /// The movie with its genres, cinemas and roster ordered by `order`.
    async fn find_movie_detail(&self, id: DbId) -> StoreResult<Option<MovieDetail>>;
    /// The persisted join rows of a movie, `None` if the movie is absent.
    async fn movie_relations(&self, id: DbId) -> StoreResult<Option<CurrentRelations>>;
    /// Movies ordered by title.
    async fn list_movies(&self, page: PageRequest) -> StoreResult<Page<Movie>>;
    /// Movies released strictly after `after`, soonest first.
    async fn upcoming_releases(&self, after: NaiveDate, limit: i64) -> StoreResult<Vec<Movie>>;
    /// Movies currently in theaters, by ascending release date.
    async fn movies_in_theaters(&self, limit: i64) -> StoreResult<Vec<Movie>>;
    /// Overwrite scalars and reconcile the join rows towards `relations`,
    /// all under one lock or transaction.
    ///
    /// The current join rows are read inside that unit, so overlapping
    /// updates of one movie apply one after the other and the last one
    /// wins. A `None` poster keeps the stored poster.
    async fn update_movie(
        &self,
        id: DbId,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> StoreResult<Option<Updated<Movie>>>;
    /// Apply a delta on its own. Fails with `NotFound` if the movie is absent
    /// and with `Conflict` if the delta was computed from join rows that
    /// have changed since.
    async fn apply_relationship_delta(&self, delta: &RelationshipDelta) -> StoreResult<()>;
    /// Remove the movie and all its join rows. The poster blob is untouched.
    async fn delete_movie(&self, id: DbId) -> StoreResult<bool>;
}
