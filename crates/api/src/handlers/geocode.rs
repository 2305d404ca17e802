//! Handlers for the `/geocode` resource, plus the lookup helpers the
//! bookmark and map handlers share.

use atlasboard_core::map::CLICK_ADDRESS_FALLBACK;
use atlasboard_core::types::Coordinates;
use atlasboard_geocode::{GeocodedPlace, ReverseGeocoded};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ForwardParams {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ReverseParams {
    pub lat: f64,
    pub lng: f64,
    /// Defaults to the configured geocoder language.
    pub language: Option<String>,
}

/// Forward-geocode `address`. A miss is [`AppError::GeocodeMiss`].
pub(crate) async fn forward_or_miss(state: &AppState, address: &str) -> AppResult<GeocodedPlace> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AppError::BadRequest("Address must not be empty".into()));
    }
    state
        .geocoder
        .forward(address)
        .await?
        .ok_or_else(|| AppError::GeocodeMiss(address.to_string()))
}

/// Reverse-geocode a click. Never fails: misses and provider errors fall
/// back to [`CLICK_ADDRESS_FALLBACK`].
pub(crate) async fn click_address(state: &AppState, at: Coordinates) -> String {
    match state
        .geocoder
        .reverse(at, &state.config.geocoder.language)
        .await
    {
        Ok(Some(ReverseGeocoded { formatted_address })) => formatted_address,
        Ok(None) => CLICK_ADDRESS_FALLBACK.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, lat = at.lat, lng = at.lng, "Reverse geocode failed");
            CLICK_ADDRESS_FALLBACK.to_string()
        }
    }
}

/// GET /api/v1/geocode/forward?address=
pub async fn forward(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ForwardParams>,
) -> AppResult<impl IntoResponse> {
    let place = forward_or_miss(&state, &params.address).await?;
    Ok(Json(DataResponse { data: place }))
}

/// GET /api/v1/geocode/reverse?lat=&lng=&language=
///
/// Unlike the click path, provider failures surface here as 502.
pub async fn reverse(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ReverseParams>,
) -> AppResult<impl IntoResponse> {
    let at = Coordinates::new(params.lat, params.lng)?;
    let language = params
        .language
        .as_deref()
        .unwrap_or(&state.config.geocoder.language);
    let place = state
        .geocoder
        .reverse(at, language)
        .await?
        .ok_or_else(|| AppError::GeocodeMiss(format!("{}, {}", at.lat, at.lng)))?;
    Ok(Json(DataResponse { data: place }))
}
