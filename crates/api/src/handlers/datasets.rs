//! Handlers for the `/datasets` resource: upload, listing, and the option
//! lists that drive chart selection forms.

use std::collections::BTreeMap;

use atlasboard_core::chart::stations;
use atlasboard_core::error::CoreError;
use atlasboard_core::population::{AgeBand, RegionOptions};
use atlasboard_core::table::{read_table, EncodingChoice, IngestOptions};
use atlasboard_core::types::DatasetId;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::session::Dataset;
use crate::state::AppState;

/// Multipart field carrying the CSV bytes.
const FILE_FIELD: &str = "file";
/// Optional multipart field with a JSON object of header renames.
const RENAMES_FIELD: &str = "renames";

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// `auto` (default), `utf-8`, `utf-8-sig`, `euc-kr`/`cp949`.
    pub encoding: Option<String>,
    #[serde(default)]
    pub header_row: usize,
}

/// Comma-separated cascading selection, e.g. `?province=서울특별시&city=종로구,중구`.
#[derive(Debug, Default, Deserialize)]
pub struct RegionParams {
    pub province: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StationParams {
    pub station_column: Option<String>,
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// POST /api/v1/datasets?encoding=&header_row=
///
/// Multipart upload with a `file` field and an optional `renames` field.
pub async fn upload_dataset(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let encoding = EncodingChoice::parse(params.encoding.as_deref().unwrap_or(""))?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut renames = BTreeMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some(FILE_FIELD) => {
                let file_name = field.file_name().unwrap_or("upload.csv").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((file_name, data.to_vec()));
            }
            Some(RENAMES_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                renames = serde_json::from_str(&text).map_err(|e| {
                    AppError::BadRequest(format!("'renames' must be a JSON object of strings: {e}"))
                })?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest(format!("Missing '{FILE_FIELD}' field")))?;
    if bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "File exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let options = IngestOptions {
        encoding,
        header_row: params.header_row,
        renames,
    };
    let (table, decoded) = read_table(&bytes, &options)?;
    let dataset = Dataset::new(file_name, table, &decoded)?;

    let mut user = auth.user_state.lock().await;
    let summary = user.datasets.insert(dataset).summary();

    tracing::info!(
        user = %auth.username,
        dataset_id = %summary.id,
        encoding = summary.encoding,
        confidence = summary.confidence,
        rows = summary.rows,
        "Dataset uploaded",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: summary })))
}

/// GET /api/v1/datasets
pub async fn list_datasets(auth: AuthUser) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    Ok(Json(DataResponse {
        data: user.datasets.summaries(),
    }))
}

/// GET /api/v1/datasets/{id}
pub async fn get_dataset(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let summary = user.datasets.get(id)?.summary();
    Ok(Json(DataResponse { data: summary }))
}

/// DELETE /api/v1/datasets/{id}
pub async fn delete_dataset(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
) -> AppResult<StatusCode> {
    let mut user = auth.user_state.lock().await;
    user.datasets.remove(id)?;
    tracing::info!(user = %auth.username, dataset_id = %id, "Dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/datasets/{id}/regions?province=&city=
pub async fn region_options(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
    Query(params): Query<RegionParams>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let population = user.datasets.get(id)?.population()?;
    let options: RegionOptions = population.options(
        &split_list(params.province.as_deref()),
        &split_list(params.city.as_deref()),
    );
    Ok(Json(DataResponse { data: options }))
}

/// GET /api/v1/datasets/{id}/age-bands
///
/// Bands that have at least one male/female column pair.
pub async fn age_bands(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let population = user.datasets.get(id)?.population()?;
    let bands: Vec<AgeBand> = AgeBand::all()
        .into_iter()
        .filter(|band| {
            population
                .age_columns()
                .iter()
                .any(|c| band.contains(c.age))
        })
        .collect();
    if bands.is_empty() {
        return Err(CoreError::EmptySelection("Dataset has no age columns".into()).into());
    }
    Ok(Json(DataResponse { data: bands }))
}

/// GET /api/v1/datasets/{id}/stations?station_column=
pub async fn station_list(
    auth: AuthUser,
    Path(id): Path<DatasetId>,
    Query(params): Query<StationParams>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let table = user.datasets.get(id)?.table();
    let names = stations(table, params.station_column.as_deref())?;
    Ok(Json(DataResponse { data: names }))
}
