//! Handlers for the `/actors` resource.
//!
//! Writes are `multipart/form-data` with the text fields `name`,
//! `biography` and `birth_date` (`YYYY-MM-DD`) and an optional `photo` file.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::blob::PHOTOS_CONTAINER;
use marquee_core::error::CoreError;
use marquee_core::types::DbId;
use marquee_db::models::actor::ActorInput;

use crate::dto::ActorDto;
use crate::error::{AppError, AppResult};
use crate::media;
use crate::multipart::FormData;
use crate::query::PaginationParams;
use crate::response::Paginated;
use crate::state::AppState;

const ENTITY: &str = "Actor";

fn actor_input(form: &FormData) -> AppResult<ActorInput> {
    Ok(ActorInput {
        name: form.text("name").unwrap_or("").to_string(),
        biography: form.optional_text("biography"),
        birth_date: form.date("birth_date")?,
        photo_url: None,
    })
}

/// GET /api/v1/actors?page=&pageSize=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.catalog.list_actors(params.page_request()).await?;
    Ok(Paginated(page.map(ActorDto::from)))
}

/// GET /api/v1/actors/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let actor = state
        .catalog
        .find_actor(id)
        .await?
        .ok_or(AppError::not_found(ENTITY, id))?;
    Ok(Json(ActorDto::from(actor)))
}

/// POST /api/v1/actors
pub async fn create(State(state): State<AppState>, multipart: Multipart) -> AppResult<StatusCode> {
    let mut form = FormData::read(multipart).await?;
    let mut input = actor_input(&form)?;
    input.validate().map_err(CoreError::from)?;

    let photo = form.take_file("photo");
    let blobs = state.blobs.as_ref();
    input.photo_url = media::store_upload(blobs, PHOTOS_CONTAINER, photo.as_ref()).await?;

    let outcome = state.catalog.create_actor(&input).await.map_err(AppError::from);
    let actor = media::settle(blobs, PHOTOS_CONTAINER, input.photo_url.as_deref(), None, outcome).await?;

    tracing::info!(actor_id = actor.id, has_photo = actor.photo_url.is_some(), "Created actor");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/actors/{id}
///
/// Without a `photo` part the stored photo is kept. With one, the new photo
/// is stored first and the old one deleted after the update commits.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<StatusCode> {
    let mut form = FormData::read(multipart).await?;
    let mut input = actor_input(&form)?;
    input.validate().map_err(CoreError::from)?;

    let photo = form.take_file("photo");
    let blobs = state.blobs.as_ref();
    input.photo_url = media::store_upload(blobs, PHOTOS_CONTAINER, photo.as_ref()).await?;

    let outcome = state
        .catalog
        .update_actor(id, &input)
        .await
        .map_err(AppError::from)
        .and_then(|updated| updated.ok_or(AppError::not_found(ENTITY, id)));
    let superseded = outcome
        .as_ref()
        .ok()
        .and_then(|updated| updated.superseded_url.clone());
    media::settle(
        blobs,
        PHOTOS_CONTAINER,
        input.photo_url.as_deref(),
        superseded.as_deref(),
        outcome,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/actors/{id}
///
/// The actor's roles are removed from every roster; the photo blob is kept.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if state.catalog.delete_actor(id).await? {
        tracing::info!(actor_id = id, "Deleted actor");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(ENTITY, id))
    }
}
