//! Handlers for the `/map` resource.

use atlasboard_core::map::build_map_view;
use atlasboard_core::types::Coordinates;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::bookmarks::ListParams;
use crate::handlers::geocode::click_address;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct ClickResponse {
    pub coordinates: Coordinates,
    /// Reverse-geocoded address, or the placeholder when lookup fails.
    pub address: String,
}

/// GET /api/v1/map?folder=&q=
pub async fn get_map(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let query = params.into_query()?;
    let user = auth.user_state.lock().await;
    let view = build_map_view(
        &user.bookmarks,
        &query,
        &user.map,
        state.config.cluster_threshold,
    );
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/map/click
///
/// Record the click first; the reverse lookup cannot fail the request.
pub async fn record_click(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ClickRequest>,
) -> AppResult<impl IntoResponse> {
    let at = Coordinates::new(input.lat, input.lng)?;
    auth.user_state.lock().await.map.record_click(at);

    let address = click_address(&state, at).await;
    tracing::debug!(user = %auth.username, lat = at.lat, lng = at.lng, "Map click recorded");

    Ok(Json(DataResponse {
        data: ClickResponse {
            coordinates: at,
            address,
        },
    }))
}
