//! Handlers for the `/folders` resource.

use atlasboard_core::bookmark::MarkerColor;
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

#[derive(Debug, Serialize)]
pub struct FolderInfo {
    pub name: String,
    pub bookmark_count: usize,
    /// Configured colour, if any.
    pub color: Option<MarkerColor>,
}

#[derive(Debug, Deserialize)]
pub struct SetColorRequest {
    pub color: MarkerColor,
}

/// GET /api/v1/folders
///
/// Folders in use plus folders that only have a configured colour.
pub async fn list_folders(auth: AuthUser) -> AppResult<impl IntoResponse> {
    let user = auth.user_state.lock().await;
    let store = &user.bookmarks;

    let mut names = store.folders();
    for configured in store.folder_colors().keys() {
        if !names.contains(configured) {
            names.push(configured.clone());
        }
    }
    names.sort();

    let folders: Vec<FolderInfo> = names
        .into_iter()
        .map(|name| FolderInfo {
            bookmark_count: store.all().iter().filter(|b| b.folder == name).count(),
            color: store.folder_color(&name),
            name,
        })
        .collect();

    Ok(Json(DataResponse { data: folders }))
}

/// PUT /api/v1/folders/{name}/color
pub async fn set_folder_color(
    auth: AuthUser,
    Path(name): Path<String>,
    Json(input): Json<SetColorRequest>,
) -> AppResult<impl IntoResponse> {
    let mut user = auth.user_state.lock().await;
    user.bookmarks.set_folder_color(&name, input.color)?;
    tracing::info!(user = %auth.username, folder = %name, color = input.color.as_str(), "Folder colour set");

    let info = FolderInfo {
        bookmark_count: user
            .bookmarks
            .all()
            .iter()
            .filter(|b| b.folder == name.trim())
            .count(),
        color: Some(input.color),
        name: name.trim().to_string(),
    };
    Ok(Json(DataResponse { data: info }))
}
