//! Chart endpoints under `/datasets/{id}/charts`.
//!
//! Each handler resolves the dataset, delegates to the matching builder in
//! `atlasboard_core::chart`, and returns the chart specification.

use atlasboard_core::chart::{
    self, AverageAgeOptions, ComparisonOptions, DeltaOptions, TimeSeriesOptions,
};
use atlasboard_core::population::{AgeBand, RegionSelection};
use atlasboard_core::types::DatasetId;
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

#[derive(Debug, Deserialize)]
pub struct PyramidRequest {
    #[serde(flatten)]
    pub selection: RegionSelection,
    /// Band labels such as `0~9세`; empty selects every band.
    #[serde(default)]
    pub age_bands: Vec<String>,
}

/// POST /api/v1/datasets/{id}/charts/pyramid
pub async fn pyramid(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
    Json(input): Json<PyramidRequest>,
) -> AppResult<impl IntoResponse> {
    let bands = AgeBand::resolve(&input.age_bands)?;
    let user = auth.user_state.lock().await;
    let population = user.datasets.get(id)?.population()?;
    let spec = chart::pyramid(population, &input.selection, &bands)?;
    tracing::debug!(user = %auth.username, dataset_id = %id, traces = spec.traces.len(), "Pyramid chart built");
    Ok(Json(DataResponse { data: spec }))
}

/// POST /api/v1/datasets/{id}/charts/delta
pub async fn delta(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
    Json(options): Json<DeltaOptions>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let spec = chart::delta_bar(user.datasets.get(id)?.table(), &options)?;
    Ok(Json(DataResponse { data: spec }))
}

/// POST /api/v1/datasets/{id}/charts/comparison
pub async fn comparison(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
    Json(options): Json<ComparisonOptions>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let spec = chart::comparison(user.datasets.get(id)?.table(), &options)?;
    Ok(Json(DataResponse { data: spec }))
}

/// POST /api/v1/datasets/{id}/charts/timeseries
pub async fn time_series(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
    Json(options): Json<TimeSeriesOptions>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let spec = chart::time_series(user.datasets.get(id)?.table(), &options)?;
    Ok(Json(DataResponse { data: spec }))
}

/// POST /api/v1/datasets/{id}/charts/average-age
pub async fn average_age(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
    Json(options): Json<AverageAgeOptions>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let spec = chart::average_age(user.datasets.get(id)?.table(), &options)?;
    Ok(Json(DataResponse { data: spec }))
}
