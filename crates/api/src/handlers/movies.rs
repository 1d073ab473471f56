//! Handlers for the `/movies` resource.
//!
//! Writes are `multipart/form-data`:
//!
//! | part           | content                                              |
//! |----------------|------------------------------------------------------|
//! | `title`        | text                                                 |
//! | `summary`      | text, optional                                       |
//! | `release_date` | `YYYY-MM-DD`                                         |
//! | `in_theaters`  | `true` / `false`, absent means `false`               |
//! | `genre_ids`    | JSON array of genre ids                              |
//! | `cinema_ids`   | JSON array of cinema ids                             |
//! | `actors`       | JSON array of `{ "actor_id", "character_name" }`     |
//! | `poster`       | image file, optional                                 |
//!
//! Every write reconciles the movie's join rows against the submitted
//! relations and commits scalars and relations together.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::blob::POSTERS_CONTAINER;
use marquee_core::error::CoreError;
use marquee_core::reconcile::{DesiredRelations, RoleAssignment};
use marquee_core::types::DbId;
use marquee_core::validation::ValidationErrors;
use marquee_db::models::movie::{validate_relations, MovieInput};

use crate::dto::{
    map_all, LandingDto, MovieCreateOptionsDto, MovieDetailDto, MovieDto, MovieEditOptionsDto,
};
use crate::error::{AppError, AppResult};
use crate::media;
use crate::multipart::FormData;
use crate::query::PaginationParams;
use crate::response::Paginated;
use crate::state::AppState;

const ENTITY: &str = "Movie";

/// Number of movies in each landing page list.
const LANDING_LIST_SIZE: i64 = 6;

/// Parse and validate a movie form. Reports title and roster problems
/// together.
fn movie_write(form: &FormData) -> AppResult<(MovieInput, DesiredRelations)> {
    let input = MovieInput {
        title: form.text("title").unwrap_or("").to_string(),
        summary: form.optional_text("summary"),
        release_date: form.date("release_date")?,
        in_theaters: form.flag("in_theaters")?,
        poster_url: None,
    };
    let relations = DesiredRelations {
        genre_ids: form.json("genre_ids")?,
        cinema_ids: form.json("cinema_ids")?,
        roster: form.json::<Vec<RoleAssignment>>("actors")?,
    };

    let mut errors = ValidationErrors::new();
    for result in [input.validate(), validate_relations(&relations)] {
        if let Err(e) = result {
            for violation in e.violations() {
                errors.push(violation.clone());
            }
        }
    }
    if !errors.is_empty() {
        return Err(CoreError::Validation(errors).into());
    }

    Ok((input, relations))
}

/// GET /api/v1/movies?page=&pageSize=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.catalog.list_movies(params.page_request()).await?;
    Ok(Paginated(page.map(MovieDto::from)))
}

/// GET /api/v1/movies/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = state
        .catalog
        .find_movie_detail(id)
        .await?
        .ok_or(AppError::not_found(ENTITY, id))?;
    Ok(Json(MovieDetailDto::from(detail)))
}

/// GET /api/v1/movies/landing
///
/// Upcoming releases (after today, soonest first) and movies in theaters.
pub async fn landing(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let today = chrono::Utc::now().date_naive();
    let upcoming = state
        .catalog
        .upcoming_releases(today, LANDING_LIST_SIZE)
        .await?;
    let in_theaters = state.catalog.movies_in_theaters(LANDING_LIST_SIZE).await?;
    Ok(Json(LandingDto {
        upcoming_releases: map_all(upcoming),
        in_theaters: map_all(in_theaters),
    }))
}

/// GET /api/v1/movies/post-get
///
/// Everything a new movie can be linked to.
pub async fn create_options(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let genres = state.catalog.all_genres().await?;
    let cinemas = state.catalog.all_cinemas().await?;
    Ok(Json(MovieCreateOptionsDto {
        genres: map_all(genres),
        cinemas: map_all(cinemas),
    }))
}

/// GET /api/v1/movies/{id}/put-get
///
/// The movie's current selections plus the genres and cinemas it does not
/// use yet.
pub async fn edit_options(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = state
        .catalog
        .find_movie_detail(id)
        .await?
        .ok_or(AppError::not_found(ENTITY, id))?;

    let genre_ids: Vec<DbId> = detail.genres.iter().map(|g| g.id).collect();
    let cinema_ids: Vec<DbId> = detail.cinemas.iter().map(|c| c.id).collect();
    let not_selected_genres = state.catalog.genres_excluding(&genre_ids).await?;
    let not_selected_cinemas = state.catalog.cinemas_excluding(&cinema_ids).await?;

    Ok(Json(MovieEditOptionsDto {
        movie: detail.movie.into(),
        selected_genres: map_all(detail.genres),
        not_selected_genres: map_all(not_selected_genres),
        selected_cinemas: map_all(detail.cinemas),
        not_selected_cinemas: map_all(not_selected_cinemas),
        actors: map_all(detail.cast),
    }))
}

/// POST /api/v1/movies
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> AppResult<StatusCode> {
    let mut form = FormData::read(multipart).await?;
    let (mut input, relations) = movie_write(&form)?;

    let poster = form.take_file("poster");
    let blobs = state.blobs.as_ref();
    input.poster_url = media::store_upload(blobs, POSTERS_CONTAINER, poster.as_ref()).await?;

    let outcome = state
        .catalog
        .create_movie(&input, &relations)
        .await
        .map_err(AppError::from);
    let movie =
        media::settle(blobs, POSTERS_CONTAINER, input.poster_url.as_deref(), None, outcome).await?;

    tracing::info!(
        movie_id = movie.id,
        genres = relations.genre_ids.len(),
        cinemas = relations.cinema_ids.len(),
        actors = relations.roster.len(),
        "Created movie",
    );
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/movies/{id}
///
/// Overwrites the scalars, reconciles genres and cinemas by set difference
/// and replaces the roster. A new poster is stored before the commit and
/// the previous one deleted after it.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<StatusCode> {
    let mut form = FormData::read(multipart).await?;
    let (mut input, desired) = movie_write(&form)?;

    let poster = form.take_file("poster");
    let blobs = state.blobs.as_ref();
    input.poster_url = media::store_upload(blobs, POSTERS_CONTAINER, poster.as_ref()).await?;

    let outcome = state
        .catalog
        .update_movie(id, &input, &desired)
        .await
        .map_err(AppError::from)
        .and_then(|updated| updated.ok_or(AppError::not_found(ENTITY, id)));
    let superseded = outcome
        .as_ref()
        .ok()
        .and_then(|updated| updated.superseded_url.clone());
    media::settle(
        blobs,
        POSTERS_CONTAINER,
        input.poster_url.as_deref(),
        superseded.as_deref(),
        outcome,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/movies/{id}
///
/// Removes the movie and every join row. The poster blob is kept.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if state.catalog.delete_movie(id).await? {
        tracing::info!(movie_id = id, "Deleted movie");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(ENTITY, id))
    }
}
