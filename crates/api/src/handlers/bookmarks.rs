//! Handlers for the `/bookmarks` resource.
//!
//! All endpoints operate on the caller's own store via [`AuthUser`].

use atlasboard_core::bookmark::{
    validate_name, BookmarkPatch, BookmarkStore, FolderFilter, Icon, ListQuery, MarkerColor,
    NewBookmark, SortMethod,
};
use atlasboard_core::error::CoreError;
use atlasboard_core::export::{export_csv, import_csv};
use atlasboard_core::map::{build_map_view, CLICK_ADDRESS_FALLBACK};
use atlasboard_core::types::{BookmarkId, Coordinates};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::geocode::{click_address, forward_or_miss};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// `?folder=&q=&sort=` for list and map views.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub folder: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> Result<ListQuery, CoreError> {
        Ok(ListQuery {
            folder: FolderFilter::parse(self.folder.as_deref()),
            query: self.q,
            sort: SortMethod::parse(self.sort.as_deref())?,
        })
    }
}

/// Where a new bookmark is placed.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationInput {
    /// Forward-geocode an address; the provider's formatted address is stored.
    Address { address: String },
    /// Explicit coordinates with an optional caller-supplied address.
    Coordinates {
        lat: f64,
        lng: f64,
        #[serde(default)]
        address: Option<String>,
    },
    /// The most recent map click.
    LastClick,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookmarkRequest {
    pub name: String,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Icon,
    #[serde(default)]
    pub color: Option<MarkerColor>,
    pub location: LocationInput,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/bookmarks?folder=&q=&sort=
pub async fn list_bookmarks(
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let query = params.into_query()?;
    let user = auth.user_state.lock().await;
    let bookmarks: Vec<_> = user.bookmarks.list(&query).into_iter().cloned().collect();
    Ok(Json(DataResponse { data: bookmarks }))
}

/// POST /api/v1/bookmarks
///
/// The name is checked before any geocoder call. Nothing is stored when the
/// location cannot be resolved.
pub async fn create_bookmark(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBookmarkRequest>,
) -> AppResult<impl IntoResponse> {
    let name = validate_name(&input.name)?;

    let (coordinates, address) = match input.location {
        LocationInput::Address { address } => {
            let place = forward_or_miss(&state, &address).await?;
            (place.coordinates, place.formatted_address)
        }
        LocationInput::Coordinates { lat, lng, address } => {
            let at = Coordinates::new(lat, lng)?;
            let address = address
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| CLICK_ADDRESS_FALLBACK.to_string());
            (at, address)
        }
        LocationInput::LastClick => {
            let click = auth.user_state.lock().await.map.last_click;
            let at = click.ok_or_else(|| {
                AppError::BadRequest("No map click recorded yet".into())
            })?;
            (at, click_address(&state, at).await)
        }
    };

    let mut user = auth.user_state.lock().await;
    let bookmark = user
        .bookmarks
        .add(NewBookmark {
            name,
            folder: input.folder,
            description: input.description,
            address,
            coordinates,
            icon: input.icon,
            color: input.color,
        })?
        .clone();

    tracing::info!(user = %auth.username, bookmark_id = %bookmark.id, folder = %bookmark.folder, "Bookmark created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: bookmark })))
}

/// GET /api/v1/bookmarks/{id}
pub async fn get_bookmark(
    auth: AuthUser,
    Path(id): Path<BookmarkId>,
) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let bookmark = user.bookmarks.get(id)?.clone();
    Ok(Json(DataResponse { data: bookmark }))
}

/// PUT /api/v1/bookmarks/{id}
pub async fn update_bookmark(
    auth: AuthUser,
    Path(id): Path<BookmarkId>,
    Json(patch): Json<BookmarkPatch>,
) -> AppResult<impl IntoResponse> {
    let mut user = auth.user_state.lock().await;
    let bookmark = user.bookmarks.update(id, patch)?.clone();
    tracing::info!(user = %auth.username, bookmark_id = %id, "Bookmark updated");
    Ok(Json(DataResponse { data: bookmark }))
}

/// DELETE /api/v1/bookmarks/{id}
pub async fn delete_bookmark(
    auth: AuthUser,
    Path(id): Path<BookmarkId>,
) -> AppResult<StatusCode> {
    let mut user = auth.user_state.lock().await;
    user.bookmarks.delete(id)?;
    tracing::info!(user = %auth.username, bookmark_id = %id, "Bookmark deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/bookmarks
///
/// Remove every bookmark and folder colour and reset the map.
pub async fn clear_bookmarks(auth: AuthUser) -> AppResult<impl IntoResponse> {
    let mut user = auth.user_state.lock().await;
    let count = user.bookmarks.clear();
    user.map.reset();
    tracing::info!(user = %auth.username, count, "Bookmarks cleared");
    Ok(Json(DataResponse {
        data: CountResponse { count },
    }))
}

/// POST /api/v1/bookmarks/{id}/view
///
/// Centre the map on a bookmark and return the resulting view.
pub async fn view_bookmark(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<BookmarkId>,
) -> AppResult<impl IntoResponse> {
    let mut guard = auth.user_state.lock().await;
    let user = &mut *guard;
    let at = user.bookmarks.get(id)?.coordinates;
    user.map.view_bookmark(id, at);

    let view = build_map_view(
        &user.bookmarks,
        &ListQuery::default(),
        &user.map,
        state.config.cluster_threshold,
    );
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/bookmarks/export
pub async fn export_bookmarks(auth: AuthUser) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let csv = export_csv(user.bookmarks.all())?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"bookmarks.csv\"",
            ),
        ],
        csv,
    ))
}

/// POST /api/v1/bookmarks/import
///
/// Body is an exported CSV file. Either every row is added or none is.
pub async fn import_bookmarks(auth: AuthUser, body: String) -> AppResult<impl IntoResponse> {
    let rows = import_csv(&body)?;

    let mut user = auth.user_state.lock().await;
    let mut staged: BookmarkStore = user.bookmarks.clone();
    for row in rows.iter().cloned() {
        staged.add(row)?;
    }
    user.bookmarks = staged;

    tracing::info!(user = %auth.username, count = rows.len(), "Bookmarks imported");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CountResponse { count: rows.len() },
        }),
    ))
}
