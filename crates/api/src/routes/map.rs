//! Route definitions for the `/map` and `/geocode` resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{geocode, map};
use crate::state::AppState;

/// Routes mounted at `/map`.
///
/// ```text
/// GET  /        -> get_map (?folder, q)
/// POST /click   -> record_click
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(map::get_map))
        .route("/click", post(map::record_click))
}

/// Routes mounted at `/geocode`.
///
/// ```text
/// GET /forward   -> forward (?address)
/// GET /reverse   -> reverse (?lat, lng, language)
/// ```
pub fn geocode_router() -> Router<AppState> {
    Router::new()
        .route("/forward", get(geocode::forward))
        .route("/reverse", get(geocode::reverse))
}
