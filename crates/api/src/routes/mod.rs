pub mod auth;
pub mod bookmarks;
pub mod datasets;
pub mod health;
pub mod map;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login or register (public)
/// /auth/logout                                 logout
///
/// /bookmarks                                   list, create, clear
/// /bookmarks/export                            CSV download
/// /bookmarks/import                            CSV upload
/// /bookmarks/{id}                              get, update, delete
/// /bookmarks/{id}/view                         centre the map on it
///
/// /folders                                     list with colours
/// /folders/{name}/color                        set colour
///
/// /map                                         map view
/// /map/click                                   record last click
///
/// /geocode/forward                             address -> coordinates
/// /geocode/reverse                             coordinates -> address
///
/// /datasets                                    list, upload
/// /datasets/{id}                               summary, delete
/// /datasets/{id}/regions                       cascading region options
/// /datasets/{id}/age-bands                     available age bands
/// /datasets/{id}/stations                      station names
/// /datasets/{id}/charts/{kind}                 chart specifications
/// ```
///
/// Everything except `/auth/login` requires a Bearer token.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/bookmarks", bookmarks::router())
        .nest("/folders", bookmarks::folder_router())
        .nest("/map", map::router())
        .nest("/geocode", map::geocode_router())
        .nest("/datasets", datasets::router(max_upload_bytes))
}
