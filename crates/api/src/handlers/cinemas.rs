//! Handlers for the `/cinemas` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::error::CoreError;
use marquee_core::types::DbId;
use marquee_db::models::cinema::CinemaInput;

use crate::dto::CinemaDto;
use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::Paginated;
use crate::state::AppState;

const ENTITY: &str = "Cinema";

/// GET /api/v1/cinemas?page=&pageSize=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.catalog.list_cinemas(params.page_request()).await?;
    Ok(Paginated(page.map(CinemaDto::from)))
}

/// GET /api/v1/cinemas/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let cinema = state
        .catalog
        .find_cinema(id)
        .await?
        .ok_or(AppError::not_found(ENTITY, id))?;
    Ok(Json(CinemaDto::from(cinema)))
}

/// POST /api/v1/cinemas
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CinemaInput>,
) -> AppResult<StatusCode> {
    input.validate().map_err(CoreError::from)?;
    let cinema = state.catalog.create_cinema(&input).await?;
    tracing::info!(cinema_id = cinema.id, "Created cinema");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/cinemas/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CinemaInput>,
) -> AppResult<StatusCode> {
    input.validate().map_err(CoreError::from)?;
    state
        .catalog
        .update_cinema(id, &input)
        .await?
        .ok_or(AppError::not_found(ENTITY, id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/cinemas/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if state.catalog.delete_cinema(id).await? {
        tracing::info!(cinema_id = id, "Deleted cinema");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(ENTITY, id))
    }
}
