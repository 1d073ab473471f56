//! Movie aggregate models and DTOs.
//!
//! A movie owns three kinds of join rows: `movie_genres`, `movie_cinemas`
//! and the ordered `movie_actors` roster. Their desired state travels as a
//! [`DesiredRelations`] next to the scalar [`MovieInput`].

use chrono::NaiveDate;
use marquee_core::reconcile::DesiredRelations;
use marquee_core::types::{DbId, Timestamp};
use marquee_core::validation::{max_length, required, ValidationErrors, Validator};
use serde::Serialize;
use sqlx::FromRow;

use super::cinema::Cinema;
use super::genre::Genre;

/// Maximum length of a movie title.
pub const MOVIE_TITLE_MAX: usize = 300;

/// Maximum length of a character name in a roster.
pub const CHARACTER_NAME_MAX: usize = 100;

/// A row from the `movies` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Movie {
    pub id: DbId,
    pub title: String,
    pub summary: Option<String>,
    pub release_date: NaiveDate,
    pub in_theaters: bool,
    pub poster_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One roster entry joined with its actor.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CastMember {
    pub actor_id: DbId,
    pub name: String,
    pub photo_url: Option<String>,
    pub character_name: String,
    pub order: i32,
}

/// A movie with its genres, cinemas and roster (ascending `order`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub genres: Vec<Genre>,
    pub cinemas: Vec<Cinema>,
    pub cast: Vec<CastMember>,
}

/// Scalar fields of a movie write.
///
/// On update, a `None` poster keeps the stored one.
#[derive(Debug, Clone)]
pub struct MovieInput {
    pub title: String,
    pub summary: Option<String>,
    pub release_date: NaiveDate,
    pub in_theaters: bool,
    pub poster_url: Option<String>,
}

impl MovieInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let title = Some(self.title.as_str());
        Validator::new()
            .check(required("title", title))
            .check(max_length("title", title, MOVIE_TITLE_MAX))
            .finish()
    }
}

/// Validate the roster part of a movie write.
///
/// Duplicate actors are allowed; only character name length is checked.
pub fn validate_relations(relations: &DesiredRelations) -> Result<(), ValidationErrors> {
    relations
        .roster
        .iter()
        .enumerate()
        .fold(Validator::new(), |v, (i, role)| {
            v.check(max_length(
                &format!("actors[{i}].character_name"),
                Some(&role.character_name),
                CHARACTER_NAME_MAX,
            ))
        })
        .finish()
}
