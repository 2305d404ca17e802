//! Route definitions for the `/bookmarks` and `/folders` resources.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{bookmarks, folders};
use crate::state::AppState;

/// Routes mounted at `/bookmarks`.
///
/// ```text
/// GET    /             -> list_bookmarks (?folder, q, sort)
/// POST   /             -> create_bookmark
/// DELETE /             -> clear_bookmarks
/// GET    /export       -> export_bookmarks (text/csv)
/// POST   /import       -> import_bookmarks
/// GET    /{id}         -> get_bookmark
/// PUT    /{id}         -> update_bookmark
/// DELETE /{id}         -> delete_bookmark
/// POST   /{id}/view    -> view_bookmark
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(bookmarks::list_bookmarks)
                .post(bookmarks::create_bookmark)
                .delete(bookmarks::clear_bookmarks),
        )
        .route("/export", get(bookmarks::export_bookmarks))
        .route("/import", post(bookmarks::import_bookmarks))
        .route(
            "/{id}",
            get(bookmarks::get_bookmark)
                .put(bookmarks::update_bookmark)
                .delete(bookmarks::delete_bookmark),
        )
        .route("/{id}/view", post(bookmarks::view_bookmark))
}

/// Routes mounted at `/folders`.
///
/// ```text
/// GET /               -> list_folders
/// PUT /{name}/color   -> set_folder_color
/// ```
pub fn folder_router() -> Router<AppState> {
    Router::new()
        .route("/", get(folders::list_folders))
        .route("/{name}/color", put(folders::set_folder_color))
}
