pub mod actors;
pub mod cinemas;
pub mod genres;
pub mod health;
pub mod movies;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /genres                       list, create
/// /genres/all                   every genre, unpaged
/// /genres/{id}                  get, update, delete
///
/// /cinemas                      list, create
/// /cinemas/{id}                 get, update, delete
///
/// /actors                       list, create (multipart)
/// /actors/{id}                  get, update (multipart), delete
///
/// /movies                       list, create (multipart)
/// /movies/landing               upcoming releases and movies in theaters
/// /movies/post-get              genres and cinemas for a new movie
/// /movies/{id}                  get, update (multipart), delete
/// /movies/{id}/put-get          selected and unselected relations
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/genres", genres::router())
        .nest("/cinemas", cinemas::router())
        .nest("/actors", actors::router())
        .nest("/movies", movies::router())
}
