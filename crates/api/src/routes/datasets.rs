//! Route definitions for the `/datasets` resource and its charts.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{charts, datasets};
use crate::state::AppState;

/// Multipart framing on top of the configured file size.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/datasets`.
///
/// ```text
/// GET    /                              -> list_datasets
/// POST   /                              -> upload_dataset (multipart, ?encoding, header_row)
/// GET    /{id}                          -> get_dataset
/// DELETE /{id}                          -> delete_dataset
/// GET    /{id}/regions                  -> region_options (?province, city)
/// GET    /{id}/age-bands                -> age_bands
/// GET    /{id}/stations                 -> station_list (?station_column)
/// POST   /{id}/charts/pyramid           -> pyramid
/// POST   /{id}/charts/delta             -> delta
/// POST   /{id}/charts/comparison        -> comparison
/// POST   /{id}/charts/timeseries        -> time_series
/// POST   /{id}/charts/average-age       -> average_age
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(datasets::list_datasets).post(datasets::upload_dataset),
        )
        .route(
            "/{id}",
            get(datasets::get_dataset).delete(datasets::delete_dataset),
        )
        .route("/{id}/regions", get(datasets::region_options))
        .route("/{id}/age-bands", get(datasets::age_bands))
        .route("/{id}/stations", get(datasets::station_list))
        .route("/{id}/charts/pyramid", post(charts::pyramid))
        .route("/{id}/charts/delta", post(charts::delta))
        .route("/{id}/charts/comparison", post(charts::comparison))
        .route("/{id}/charts/timeseries", post(charts::time_series))
        .route("/{id}/charts/average-age", post(charts::average_age))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
}
