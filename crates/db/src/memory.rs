//! In-memory [`CatalogStore`] for development and tests.
//!
//! All tables live behind one `tokio::sync::RwLock`. Every write takes the
//! write lock, checks the whole request against the current state, and only
//! then mutates anything, so a rejected write leaves no trace.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use marquee_core::error::CoreError;
use marquee_core::pagination::{paginate, Page, PageRequest};
use marquee_core::reconcile::{
    reconcile, CurrentRelations, DesiredRelations, JoinOp, JoinRow, RelationshipDelta, RoleRow,
};
use marquee_core::types::DbId;
use marquee_core::validation::ValidationErrors;
use tokio::sync::RwLock;

use crate::models::actor::{Actor, ActorInput};
use crate::models::cinema::{Cinema, CinemaInput};
use crate::models::genre::{Genre, GenreInput};
use crate::models::movie::{CastMember, Movie, MovieDetail, MovieInput};
use crate::store::{CatalogStore, StoreResult, Updated};

/// Genres seeded by [`MemoryCatalogStore::with_demo_genres`].
pub const DEMO_GENRES: [&str; 4] = ["Comedia", "Drama", "Acción", "Aventura"];

/// A role row keyed by `(movie_id, order)`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Role {
    actor_id: DbId,
    character_name: String,
}

#[derive(Debug, Default)]
struct Tables {
    genres: BTreeMap<DbId, Genre>,
    cinemas: BTreeMap<DbId, Cinema>,
    actors: BTreeMap<DbId, Actor>,
    movies: BTreeMap<DbId, Movie>,
    movie_genres: BTreeSet<(DbId, DbId)>,
    movie_cinemas: BTreeSet<(DbId, DbId)>,
    movie_actors: BTreeMap<(DbId, i32), Role>,
    last_id: DbId,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn relations(&self, movie_id: DbId) -> CurrentRelations {
        CurrentRelations {
            genre_ids: self
                .movie_genres
                .range((movie_id, DbId::MIN)..=(movie_id, DbId::MAX))
                .map(|&(_, genre_id)| genre_id)
                .collect(),
            cinema_ids: self
                .movie_cinemas
                .range((movie_id, DbId::MIN)..=(movie_id, DbId::MAX))
                .map(|&(_, cinema_id)| cinema_id)
                .collect(),
            roster: self
                .roles_of(movie_id)
                .map(|(order, role)| RoleRow {
                    actor_id: role.actor_id,
                    character_name: role.character_name.clone(),
                    order,
                })
                .collect(),
        }
    }

    fn roles_of(&self, movie_id: DbId) -> impl Iterator<Item = (i32, &Role)> {
        self.movie_actors
            .range((movie_id, i32::MIN)..=(movie_id, i32::MAX))
            .map(|(&(_, order), role)| (order, role))
    }

    /// Check `delta` against the current state.
    ///
    /// A delta whose deletes no longer match the persisted join rows is a
    /// conflict. Unknown referenced ids are a validation error on
    /// `relations`. An insert that would collide with a row surviving the
    /// deletes is a conflict.
    fn check_delta(&self, delta: &RelationshipDelta) -> StoreResult<()> {
        if !delta.deletes_match(&self.relations(delta.movie_id)) {
            return Err(stale_delta(delta.movie_id));
        }

        let refs = delta.referenced_ids();
        let unknown = refs.genre_ids.iter().any(|id| !self.genres.contains_key(id))
            || refs.cinema_ids.iter().any(|id| !self.cinemas.contains_key(id))
            || refs.actor_ids.iter().any(|id| !self.actors.contains_key(id));
        if unknown {
            return Err(unknown_reference());
        }

        let movie_id = delta.movie_id;
        let mut genres: BTreeSet<DbId> = self.relations(movie_id).genre_ids.into_iter().collect();
        let mut cinemas: BTreeSet<DbId> = self.relations(movie_id).cinema_ids.into_iter().collect();
        let mut orders: BTreeSet<i32> = self.roles_of(movie_id).map(|(order, _)| order).collect();

        for op in &delta.ops {
            match op {
                JoinOp::Delete(JoinRow::Genre { genre_id }) => {
                    genres.remove(genre_id);
                }
                JoinOp::Delete(JoinRow::Cinema { cinema_id }) => {
                    cinemas.remove(cinema_id);
                }
                JoinOp::Delete(JoinRow::Role { order, .. }) => {
                    orders.remove(order);
                }
                JoinOp::Insert(JoinRow::Genre { genre_id }) if !genres.insert(*genre_id) => {
                    return Err(duplicate_row("movie_genres"));
                }
                JoinOp::Insert(JoinRow::Cinema { cinema_id }) if !cinemas.insert(*cinema_id) => {
                    return Err(duplicate_row("movie_cinemas"));
                }
                JoinOp::Insert(JoinRow::Role { order, .. }) if !orders.insert(*order) => {
                    return Err(duplicate_row("movie_actors"));
                }
                JoinOp::Insert(_) => {}
            }
        }
        Ok(())
    }

    /// Apply a delta that already passed [`Tables::check_delta`].
    fn apply_delta(&mut self, delta: &RelationshipDelta) {
        let movie_id = delta.movie_id;
        for op in &delta.ops {
            match op {
                JoinOp::Delete(JoinRow::Genre { genre_id }) => {
                    self.movie_genres.remove(&(movie_id, *genre_id));
                }
                JoinOp::Delete(JoinRow::Cinema { cinema_id }) => {
                    self.movie_cinemas.remove(&(movie_id, *cinema_id));
                }
                JoinOp::Delete(JoinRow::Role { order, .. }) => {
                    self.movie_actors.remove(&(movie_id, *order));
                }
                JoinOp::Insert(JoinRow::Genre { genre_id }) => {
                    self.movie_genres.insert((movie_id, *genre_id));
                }
                JoinOp::Insert(JoinRow::Cinema { cinema_id }) => {
                    self.movie_cinemas.insert((movie_id, *cinema_id));
                }
                JoinOp::Insert(JoinRow::Role {
                    actor_id,
                    character_name,
                    order,
                }) => {
                    self.movie_actors.insert(
                        (movie_id, *order),
                        Role {
                            actor_id: *actor_id,
                            character_name: character_name.clone(),
                        },
                    );
                }
            }
        }
        tracing::debug!(
            movie_id,
            inserts = delta.inserts().count(),
            deletes = delta.deletes().count(),
            "Applied relationship delta",
        );
    }

    fn remove_movie_joins(&mut self, movie_id: DbId) {
        self.movie_genres.retain(|&(m, _)| m != movie_id);
        self.movie_cinemas.retain(|&(m, _)| m != movie_id);
        self.movie_actors.retain(|&(m, _), _| m != movie_id);
    }

    /// Drop every role of `actor_id` and close the gaps it leaves.
    fn remove_actor_roles(&mut self, actor_id: DbId) {
        let affected: BTreeSet<DbId> = self
            .movie_actors
            .iter()
            .filter(|(_, role)| role.actor_id == actor_id)
            .map(|(&(movie_id, _), _)| movie_id)
            .collect();

        for movie_id in affected {
            let remaining: Vec<Role> = self
                .roles_of(movie_id)
                .filter(|(_, role)| role.actor_id != actor_id)
                .map(|(_, role)| role.clone())
                .collect();
            self.movie_actors.retain(|&(m, _), _| m != movie_id);
            for (order, role) in remaining.into_iter().enumerate() {
                self.movie_actors.insert((movie_id, order as i32), role);
            }
        }
    }
}

fn unknown_reference() -> CoreError {
    CoreError::Validation(ValidationErrors::single(
        "relations",
        "References an unknown genre, cinema or actor",
    ))
}

fn stale_delta(movie_id: DbId) -> CoreError {
    CoreError::Conflict(format!(
        "Relations of movie {movie_id} changed since they were read"
    ))
}

fn duplicate_row(table: &str) -> CoreError {
    CoreError::Conflict(format!("Duplicate value violates unique constraint: {table}"))
}

fn by_name<T>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> (String, DbId)) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| key(row));
    rows
}

/// Catalog held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the demo genres.
    pub fn with_demo_genres() -> Self {
        let mut tables = Tables::default();
        let now = Utc::now();
        for name in DEMO_GENRES {
            let id = tables.next_id();
            tables.genres.insert(
                id,
                Genre {
                    id,
                    name: name.to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    fn sorted_genres<'a>(genres: impl Iterator<Item = &'a Genre>) -> Vec<Genre> {
        by_name(genres.cloned(), |g| (g.name.clone(), g.id))
    }

    fn sorted_cinemas<'a>(cinemas: impl Iterator<Item = &'a Cinema>) -> Vec<Cinema> {
        by_name(cinemas.cloned(), |c| (c.name.clone(), c.id))
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    // -- genres -------------------------------------------------------------

    async fn create_genre(&self, input: &GenreInput) -> StoreResult<Genre> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let now = Utc::now();
        let genre = Genre {
            id,
            name: input.name.clone(),
            created_at: now,
            updated_at: now,
        };
        t.genres.insert(id, genre.clone());
        Ok(genre)
    }

    async fn find_genre(&self, id: DbId) -> StoreResult<Option<Genre>> {
        Ok(self.tables.read().await.genres.get(&id).cloned())
    }

    async fn list_genres(&self, page: PageRequest) -> StoreResult<Page<Genre>> {
        let t = self.tables.read().await;
        Ok(paginate(Self::sorted_genres(t.genres.values()), page))
    }

    async fn all_genres(&self) -> StoreResult<Vec<Genre>> {
        let t = self.tables.read().await;
        Ok(Self::sorted_genres(t.genres.values()))
    }

    async fn genres_excluding(&self, ids: &[DbId]) -> StoreResult<Vec<Genre>> {
        let t = self.tables.read().await;
        Ok(Self::sorted_genres(
            t.genres.values().filter(|g| !ids.contains(&g.id)),
        ))
    }

    async fn update_genre(&self, id: DbId, input: &GenreInput) -> StoreResult<Option<Genre>> {
        let mut t = self.tables.write().await;
        Ok(t.genres.get_mut(&id).map(|genre| {
            genre.name = input.name.clone();
            genre.updated_at = Utc::now();
            genre.clone()
        }))
    }

    async fn delete_genre(&self, id: DbId) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.genres.remove(&id).is_none() {
            return Ok(false);
        }
        t.movie_genres.retain(|&(_, genre_id)| genre_id != id);
        Ok(true)
    }

    // -- cinemas ------------------------------------------------------------

    async fn create_cinema(&self, input: &CinemaInput) -> StoreResult<Cinema> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let now = Utc::now();
        let cinema = Cinema {
            id,
            name: input.name.clone(),
            latitude: input.location.map(|p| p.latitude),
            longitude: input.location.map(|p| p.longitude),
            created_at: now,
            updated_at: now,
        };
        t.cinemas.insert(id, cinema.clone());
        Ok(cinema)
    }

    async fn find_cinema(&self, id: DbId) -> StoreResult<Option<Cinema>> {
        Ok(self.tables.read().await.cinemas.get(&id).cloned())
    }

    async fn list_cinemas(&self, page: PageRequest) -> StoreResult<Page<Cinema>> {
        let t = self.tables.read().await;
        Ok(paginate(Self::sorted_cinemas(t.cinemas.values()), page))
    }

    async fn all_cinemas(&self) -> StoreResult<Vec<Cinema>> {
        let t = self.tables.read().await;
        Ok(Self::sorted_cinemas(t.cinemas.values()))
    }

    async fn cinemas_excluding(&self, ids: &[DbId]) -> StoreResult<Vec<Cinema>> {
        let t = self.tables.read().await;
        Ok(Self::sorted_cinemas(
            t.cinemas.values().filter(|c| !ids.contains(&c.id)),
        ))
    }

    async fn update_cinema(&self, id: DbId, input: &CinemaInput) -> StoreResult<Option<Cinema>> {
        let mut t = self.tables.write().await;
        Ok(t.cinemas.get_mut(&id).map(|cinema| {
            cinema.name = input.name.clone();
            cinema.latitude = input.location.map(|p| p.latitude);
            cinema.longitude = input.location.map(|p| p.longitude);
            cinema.updated_at = Utc::now();
            cinema.clone()
        }))
    }

    async fn delete_cinema(&self, id: DbId) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.cinemas.remove(&id).is_none() {
            return Ok(false);
        }
        t.movie_cinemas.retain(|&(_, cinema_id)| cinema_id != id);
        Ok(true)
    }

    // -- actors -------------------------------------------------------------

    async fn create_actor(&self, input: &ActorInput) -> StoreResult<Actor> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let now = Utc::now();
        let actor = Actor {
            id,
            name: input.name.clone(),
            biography: input.biography.clone(),
            birth_date: input.birth_date,
            photo_url: input.photo_url.clone(),
            created_at: now,
            updated_at: now,
        };
        t.actors.insert(id, actor.clone());
        Ok(actor)
    }

    async fn find_actor(&self, id: DbId) -> StoreResult<Option<Actor>> {
        Ok(self.tables.read().await.actors.get(&id).cloned())
    }

    async fn list_actors(&self, page: PageRequest) -> StoreResult<Page<Actor>> {
        let t = self.tables.read().await;
        let actors = by_name(t.actors.values().cloned(), |a| (a.name.clone(), a.id));
        Ok(paginate(actors, page))
    }

    async fn update_actor(
        &self,
        id: DbId,
        input: &ActorInput,
    ) -> StoreResult<Option<Updated<Actor>>> {
        let mut t = self.tables.write().await;
        Ok(t.actors.get_mut(&id).map(|actor| {
            let previous_url = actor.photo_url.clone();
            actor.name = input.name.clone();
            actor.biography = input.biography.clone();
            actor.birth_date = input.birth_date;
            if let Some(photo_url) = &input.photo_url {
                actor.photo_url = Some(photo_url.clone());
            }
            actor.updated_at = Utc::now();
            Updated::new(actor.clone(), previous_url, input.photo_url.as_deref())
        }))
    }

    async fn delete_actor(&self, id: DbId) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.actors.remove(&id).is_none() {
            return Ok(false);
        }
        t.remove_actor_roles(id);
        Ok(true)
    }

    // -- movies -------------------------------------------------------------

    async fn create_movie(
        &self,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> StoreResult<Movie> {
        let mut t = self.tables.write().await;
        let id = t.next_id();
        let delta = reconcile(id, &CurrentRelations::default(), relations);
        t.check_delta(&delta)?;

        let now = Utc::now();
        let movie = Movie {
            id,
            title: input.title.clone(),
            summary: input.summary.clone(),
            release_date: input.release_date,
            in_theaters: input.in_theaters,
            poster_url: input.poster_url.clone(),
            created_at: now,
            updated_at: now,
        };
        t.movies.insert(id, movie.clone());
        t.apply_delta(&delta);
        Ok(movie)
    }

    async fn find_movie(&self, id: DbId) -> StoreResult<Option<Movie>> {
        Ok(self.tables.read().await.movies.get(&id).cloned())
    }

    async fn find_movie_detail(&self, id: DbId) -> StoreResult<Option<MovieDetail>> {
        let t = self.tables.read().await;
        let Some(movie) = t.movies.get(&id).cloned() else {
            return Ok(None);
        };
        let relations = t.relations(id);
        let genres = Self::sorted_genres(
            relations
                .genre_ids
                .iter()
                .filter_map(|genre_id| t.genres.get(genre_id)),
        );
        let cinemas = Self::sorted_cinemas(
            relations
                .cinema_ids
                .iter()
                .filter_map(|cinema_id| t.cinemas.get(cinema_id)),
        );
        let cast = t
            .roles_of(id)
            .filter_map(|(order, role)| {
                t.actors.get(&role.actor_id).map(|actor| CastMember {
                    actor_id: actor.id,
                    name: actor.name.clone(),
                    photo_url: actor.photo_url.clone(),
                    character_name: role.character_name.clone(),
                    order,
                })
            })
            .collect();
        Ok(Some(MovieDetail {
            movie,
            genres,
            cinemas,
            cast,
        }))
    }

    async fn movie_relations(&self, id: DbId) -> StoreResult<Option<CurrentRelations>> {
        let t = self.tables.read().await;
        Ok(t.movies.contains_key(&id).then(|| t.relations(id)))
    }

    async fn list_movies(&self, page: PageRequest) -> StoreResult<Page<Movie>> {
        let t = self.tables.read().await;
        let movies = by_name(t.movies.values().cloned(), |m| (m.title.clone(), m.id));
        Ok(paginate(movies, page))
    }

    async fn upcoming_releases(&self, after: NaiveDate, limit: i64) -> StoreResult<Vec<Movie>> {
        let t = self.tables.read().await;
        let mut movies: Vec<Movie> = t
            .movies
            .values()
            .filter(|m| m.release_date > after)
            .cloned()
            .collect();
        movies.sort_by_key(|m| (m.release_date, m.id));
        movies.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(movies)
    }

    async fn movies_in_theaters(&self, limit: i64) -> StoreResult<Vec<Movie>> {
        let t = self.tables.read().await;
        let mut movies: Vec<Movie> = t
            .movies
            .values()
            .filter(|m| m.in_theaters)
            .cloned()
            .collect();
        movies.sort_by_key(|m| (m.release_date, m.id));
        movies.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(movies)
    }

    async fn update_movie(
        &self,
        id: DbId,
        input: &MovieInput,
        relations: &DesiredRelations,
    ) -> StoreResult<Option<Updated<Movie>>> {
        let mut t = self.tables.write().await;
        let Some(previous_url) = t.movies.get(&id).map(|m| m.poster_url.clone()) else {
            return Ok(None);
        };
        let delta = reconcile(id, &t.relations(id), relations);
        t.check_delta(&delta)?;

        let updated = t.movies.get_mut(&id).map(|movie| {
            movie.title = input.title.clone();
            movie.summary = input.summary.clone();
            movie.release_date = input.release_date;
            movie.in_theaters = input.in_theaters;
            if let Some(poster_url) = &input.poster_url {
                movie.poster_url = Some(poster_url.clone());
            }
            movie.updated_at = Utc::now();
            movie.clone()
        });
        t.apply_delta(&delta);
        Ok(updated.map(|movie| Updated::new(movie, previous_url, input.poster_url.as_deref())))
    }

    async fn apply_relationship_delta(&self, delta: &RelationshipDelta) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.movies.contains_key(&delta.movie_id) {
            return Err(CoreError::NotFound {
                entity: "Movie",
                id: delta.movie_id,
            });
        }
        t.check_delta(delta)?;
        t.apply_delta(delta);
        Ok(())
    }

    async fn delete_movie(&self, id: DbId) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.movies.remove(&id).is_none() {
            return Ok(false);
        }
        t.remove_movie_joins(id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use marquee_core::reconcile::RoleAssignment;

    use super::*;

    fn movie_input(title: &str) -> MovieInput {
        MovieInput {
            title: title.to_string(),
            summary: None,
            release_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            in_theaters: false,
            poster_url: None,
        }
    }

    async fn actor(store: &MemoryCatalogStore, name: &str) -> DbId {
        store
            .create_actor(&ActorInput {
                name: name.to_string(),
                biography: None,
                birth_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
                photo_url: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn demo_genres_are_listed_by_name() {
        let store = MemoryCatalogStore::with_demo_genres();
        let names: Vec<String> = store
            .all_genres()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, ["Acción", "Aventura", "Comedia", "Drama"]);
    }

    #[tokio::test]
    async fn unknown_genre_rejects_whole_create() {
        let store = MemoryCatalogStore::new();
        let relations = DesiredRelations {
            genre_ids: vec![999],
            ..Default::default()
        };
        let err = store
            .create_movie(&movie_input("Dune"), &relations)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(ref e) if e.has_field("relations"));
        assert_eq!(store.list_movies(PageRequest::default()).await.unwrap().total_count, 0);
    }

    #[tokio::test]
    async fn rejected_delta_leaves_state_untouched() {
        let store = MemoryCatalogStore::new();
        let a = actor(&store, "Ana").await;
        let relations = DesiredRelations {
            roster: vec![RoleAssignment {
                actor_id: a,
                character_name: "Lead".into(),
            }],
            ..Default::default()
        };
        let movie = store.create_movie(&movie_input("Dune"), &relations).await.unwrap();
        let before = store.movie_relations(movie.id).await.unwrap().unwrap();

        let desired = DesiredRelations {
            genre_ids: vec![424242],
            ..Default::default()
        };
        let delta = reconcile(movie.id, &before, &desired);
        assert!(store.apply_relationship_delta(&delta).await.is_err());

        assert_eq!(store.movie_relations(movie.id).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn deleting_an_actor_renumbers_rosters() {
        let store = MemoryCatalogStore::new();
        let a = actor(&store, "Ana").await;
        let b = actor(&store, "Ben").await;
        let c = actor(&store, "Cat").await;
        let roster = [(a, "X"), (b, "Y"), (c, "Z")]
            .into_iter()
            .map(|(actor_id, name)| RoleAssignment {
                actor_id,
                character_name: name.into(),
            })
            .collect();
        let movie = store
            .create_movie(
                &movie_input("Dune"),
                &DesiredRelations {
                    roster,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(store.delete_actor(b).await.unwrap());

        let roster = store.movie_relations(movie.id).await.unwrap().unwrap().roster;
        let orders: Vec<(DbId, i32)> = roster.iter().map(|r| (r.actor_id, r.order)).collect();
        assert_eq!(orders, [(a, 0), (c, 1)]);
    }

    #[tokio::test]
    async fn update_without_poster_keeps_stored_poster() {
        let store = MemoryCatalogStore::new();
        let mut input = movie_input("Dune");
        input.poster_url = Some("http://cdn/movies/a.jpg".into());
        let movie = store
            .create_movie(&input, &DesiredRelations::default())
            .await
            .unwrap();

        let mut edit = movie_input("Dune: Part One");
        edit.poster_url = None;
        let updated = store
            .update_movie(movie.id, &edit, &DesiredRelations::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.record.title, "Dune: Part One");
        assert_eq!(updated.record.poster_url.as_deref(), Some("http://cdn/movies/a.jpg"));
        assert_eq!(updated.superseded_url, None);
    }

    #[tokio::test]
    async fn update_with_new_poster_reports_the_replaced_one() {
        let store = MemoryCatalogStore::new();
        let mut input = movie_input("Dune");
        input.poster_url = Some("http://cdn/movies/a.jpg".into());
        let movie = store
            .create_movie(&input, &DesiredRelations::default())
            .await
            .unwrap();

        input.poster_url = Some("http://cdn/movies/b.jpg".into());
        let updated = store
            .update_movie(movie.id, &input, &DesiredRelations::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.record.poster_url.as_deref(), Some("http://cdn/movies/b.jpg"));
        assert_eq!(updated.superseded_url.as_deref(), Some("http://cdn/movies/a.jpg"));
    }

    #[tokio::test]
    async fn delta_from_a_stale_read_is_a_conflict() {
        let store = MemoryCatalogStore::new();
        let a = actor(&store, "Ana").await;
        let b = actor(&store, "Ben").await;
        let roster = vec![RoleAssignment {
            actor_id: a,
            character_name: "Lead".into(),
        }];
        let movie = store
            .create_movie(
                &movie_input("Dune"),
                &DesiredRelations {
                    roster,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let stale = store.movie_relations(movie.id).await.unwrap().unwrap();

        let grown = DesiredRelations {
            roster: vec![
                RoleAssignment {
                    actor_id: a,
                    character_name: "Lead".into(),
                },
                RoleAssignment {
                    actor_id: b,
                    character_name: "Rival".into(),
                },
            ],
            ..Default::default()
        };
        store
            .update_movie(movie.id, &movie_input("Dune"), &grown)
            .await
            .unwrap();
        let after_update = store.movie_relations(movie.id).await.unwrap().unwrap();

        let delta = reconcile(movie.id, &stale, &DesiredRelations::default());
        assert_matches!(
            store.apply_relationship_delta(&delta).await,
            Err(CoreError::Conflict(_))
        );
        assert_eq!(
            store.movie_relations(movie.id).await.unwrap().unwrap(),
            after_update
        );
    }

    #[tokio::test]
    async fn update_of_missing_movie_is_none() {
        let store = MemoryCatalogStore::new();
        let delta = RelationshipDelta {
            movie_id: 7,
            ops: Vec::new(),
        };
        assert!(store
            .update_movie(7, &movie_input("Ghost"), &DesiredRelations::default())
            .await
            .unwrap()
            .is_none());
        assert_matches!(
            store.apply_relationship_delta(&delta).await,
            Err(CoreError::NotFound { id: 7, .. })
        );
    }
}
