//! Handlers for the `/genres` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::error::CoreError;
use marquee_core::types::DbId;
use marquee_db::models::genre::GenreInput;

use crate::dto::{map_all, GenreDto};
use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::Paginated;
use crate::state::AppState;

const ENTITY: &str = "Genre";

/// GET /api/v1/genres?page=&pageSize=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.catalog.list_genres(params.page_request()).await?;
    Ok(Paginated(page.map(GenreDto::from)))
}

/// GET /api/v1/genres/all
pub async fn list_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let genres = state.catalog.all_genres().await?;
    Ok(Json(map_all::<_, GenreDto>(genres)))
}

/// GET /api/v1/genres/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let genre = state
        .catalog
        .find_genre(id)
        .await?
        .ok_or(AppError::not_found(ENTITY, id))?;
    Ok(Json(GenreDto::from(genre)))
}

/// POST /api/v1/genres
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<GenreInput>,
) -> AppResult<StatusCode> {
    input.validate().map_err(CoreError::from)?;
    let genre = state.catalog.create_genre(&input).await?;
    tracing::info!(genre_id = genre.id, "Created genre");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/genres/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<GenreInput>,
) -> AppResult<StatusCode> {
    input.validate().map_err(CoreError::from)?;
    state
        .catalog
        .update_genre(id, &input)
        .await?
        .ok_or(AppError::not_found(ENTITY, id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/genres/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if state.catalog.delete_genre(id).await? {
        tracing::info!(genre_id = id, "Deleted genre");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(ENTITY, id))
    }
}
