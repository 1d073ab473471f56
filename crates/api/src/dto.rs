//! Response bodies and their mappings from catalog models.
//!
//! Every mapping is an explicit `From` impl so the wire shape stays
//! independent of the row structs.

use chrono::NaiveDate;
use marquee_core::types::DbId;
use marquee_db::models::actor::Actor;
use marquee_db::models::cinema::{Cinema, GeoPoint};
use marquee_db::models::genre::Genre;
use marquee_db::models::movie::{CastMember, Movie, MovieDetail};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GenreDto {
    pub id: DbId,
    pub name: String,
}

impl From<Genre> for GenreDto {
    fn from(genre: Genre) -> Self {
        Self {
            id: genre.id,
            name: genre.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CinemaDto {
    pub id: DbId,
    pub name: String,
    pub location: Option<GeoPoint>,
}

impl From<Cinema> for CinemaDto {
    fn from(cinema: Cinema) -> Self {
        Self {
            location: cinema.location(),
            id: cinema.id,
            name: cinema.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActorDto {
    pub id: DbId,
    pub name: String,
    pub biography: Option<String>,
    pub birth_date: NaiveDate,
    pub photo_url: Option<String>,
}

impl From<Actor> for ActorDto {
    fn from(actor: Actor) -> Self {
        Self {
            id: actor.id,
            name: actor.name,
            biography: actor.biography,
            birth_date: actor.birth_date,
            photo_url: actor.photo_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieDto {
    pub id: DbId,
    pub title: String,
    pub summary: Option<String>,
    pub release_date: NaiveDate,
    pub in_theaters: bool,
    pub poster_url: Option<String>,
}

impl From<Movie> for MovieDto {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            summary: movie.summary,
            release_date: movie.release_date,
            in_theaters: movie.in_theaters,
            poster_url: movie.poster_url,
        }
    }
}

/// One roster entry of a movie.
#[derive(Debug, Serialize)]
pub struct CastMemberDto {
    pub actor_id: DbId,
    pub name: String,
    pub photo_url: Option<String>,
    pub character_name: String,
    pub order: i32,
}

impl From<CastMember> for CastMemberDto {
    fn from(member: CastMember) -> Self {
        Self {
            actor_id: member.actor_id,
            name: member.name,
            photo_url: member.photo_url,
            character_name: member.character_name,
            order: member.order,
        }
    }
}

/// `GET /movies/{id}`: scalars plus relations, roster by ascending order.
#[derive(Debug, Serialize)]
pub struct MovieDetailDto {
    #[serde(flatten)]
    pub movie: MovieDto,
    pub genres: Vec<GenreDto>,
    pub cinemas: Vec<CinemaDto>,
    pub actors: Vec<CastMemberDto>,
}

impl From<MovieDetail> for MovieDetailDto {
    fn from(detail: MovieDetail) -> Self {
        Self {
            movie: detail.movie.into(),
            genres: map_all(detail.genres),
            cinemas: map_all(detail.cinemas),
            actors: map_all(detail.cast),
        }
    }
}

/// `GET /movies/landing`.
#[derive(Debug, Serialize)]
pub struct LandingDto {
    pub upcoming_releases: Vec<MovieDto>,
    pub in_theaters: Vec<MovieDto>,
}

/// `GET /movies/post-get`: everything a new movie can be linked to.
#[derive(Debug, Serialize)]
pub struct MovieCreateOptionsDto {
    pub genres: Vec<GenreDto>,
    pub cinemas: Vec<CinemaDto>,
}

/// `GET /movies/{id}/put-get`: current selections and what is left to pick.
#[derive(Debug, Serialize)]
pub struct MovieEditOptionsDto {
    pub movie: MovieDto,
    pub selected_genres: Vec<GenreDto>,
    pub not_selected_genres: Vec<GenreDto>,
    pub selected_cinemas: Vec<CinemaDto>,
    pub not_selected_cinemas: Vec<CinemaDto>,
    pub actors: Vec<CastMemberDto>,
}

/// Convert every element with its `From` mapping.
pub fn map_all<T, U: From<T>>(items: Vec<T>) -> Vec<U> {
    items.into_iter().map(U::from).collect()
}
