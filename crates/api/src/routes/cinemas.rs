use axum::routing::get;
use axum::Router;

use crate::handlers::cinemas;
use crate::state::AppState;

/// Routes mounted at `/cinemas`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cinemas::list).post(cinemas::create))
        .route(
            "/{id}",
            get(cinemas::get_by_id)
                .put(cinemas::update)
                .delete(cinemas::delete),
        )
}
