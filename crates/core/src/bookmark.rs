//! In-memory bookmark store with folder colours, filtering and sorting.
//!
//! Bookmarks are identified by a stable id assigned at creation. List
//! views are computed per request; positions in a view carry no identity.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{is_all_sentinel, BookmarkId, Coordinates, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Folder assigned when none is given.
pub const DEFAULT_FOLDER: &str = "기본";

/// Maximum bookmark name length in characters.
pub const MAX_NAME_LEN: usize = 200;

/* --------------------------------------------------------------------------
Marker styling
-------------------------------------------------------------------------- */

/// Marker glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    #[default]
    InfoSign,
    Home,
    Star,
    Flag,
    Cloud,
    Heart,
    Gift,
    Leaf,
}

impl Icon {
    pub const ALL: [Icon; 8] = [
        Icon::InfoSign,
        Icon::Home,
        Icon::Star,
        Icon::Flag,
        Icon::Cloud,
        Icon::Heart,
        Icon::Gift,
        Icon::Leaf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Icon::InfoSign => "info-sign",
            Icon::Home => "home",
            Icon::Star => "star",
            Icon::Flag => "flag",
            Icon::Cloud => "cloud",
            Icon::Heart => "heart",
            Icon::Gift => "gift",
            Icon::Leaf => "leaf",
        }
    }

    pub fn parse(name: &str) -> Result<Self, CoreError> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == name)
            .ok_or_else(|| CoreError::Validation(format!("Unknown icon '{name}'")))
    }
}

/// Marker colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Red,
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
    Darkred,
    Lightblue,
    Black,
}

impl MarkerColor {
    pub const ALL: [MarkerColor; 8] = [
        MarkerColor::Red,
        MarkerColor::Blue,
        MarkerColor::Green,
        MarkerColor::Purple,
        MarkerColor::Orange,
        MarkerColor::Darkred,
        MarkerColor::Lightblue,
        MarkerColor::Black,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MarkerColor::Red => "red",
            MarkerColor::Blue => "blue",
            MarkerColor::Green => "green",
            MarkerColor::Purple => "purple",
            MarkerColor::Orange => "orange",
            MarkerColor::Darkred => "darkred",
            MarkerColor::Lightblue => "lightblue",
            MarkerColor::Black => "black",
        }
    }

    pub fn parse(name: &str) -> Result<Self, CoreError> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::Validation(format!("Unknown marker color '{name}'")))
    }
}

/* --------------------------------------------------------------------------
Types
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub name: String,
    pub folder: String,
    pub description: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub icon: Icon,
    pub color: MarkerColor,
    pub created_at: Timestamp,
}

/// Input for [`BookmarkStore::add`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBookmark {
    pub name: String,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub icon: Icon,
    /// Explicit colour; otherwise derived from the folder.
    #[serde(default)]
    pub color: Option<MarkerColor>,
}

/// Partial edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookmarkPatch {
    pub name: Option<String>,
    pub folder: Option<String>,
    pub description: Option<String>,
    pub icon: Option<Icon>,
    pub color: Option<MarkerColor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FolderFilter {
    #[default]
    All,
    Named(String),
}

impl FolderFilter {
    /// `None`, empty, or `전체`/`all` is [`FolderFilter::All`].
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => FolderFilter::All,
            Some(v) if is_all_sentinel(v) => FolderFilter::All,
            Some(v) => FolderFilter::Named(v.to_string()),
        }
    }

    fn matches(&self, folder: &str) -> bool {
        match self {
            FolderFilter::All => true,
            FolderFilter::Named(name) => name == folder,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMethod {
    Name,
    Folder,
    #[default]
    Recent,
}

impl SortMethod {
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("recent") => Ok(SortMethod::Recent),
            Some("name") => Ok(SortMethod::Name),
            Some("folder") => Ok(SortMethod::Folder),
            Some(other) => Err(CoreError::Validation(format!(
                "Unknown sort method '{other}'; expected name, folder or recent"
            ))),
        }
    }
}

/// Filter and order for [`BookmarkStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub folder: FolderFilter,
    /// Case-insensitive substring of name or description.
    pub query: Option<String>,
    pub sort: SortMethod,
}

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

/// Trimmed name, or `Validation` when blank or too long.
pub fn validate_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Bookmark name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Bookmark name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn normalize_folder(folder: Option<&str>) -> String {
    match folder.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_string(),
        _ => DEFAULT_FOLDER.to_string(),
    }
}

/* --------------------------------------------------------------------------
Store
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Default)]
pub struct BookmarkStore {
    /// Insertion order; the last element is the most recent.
    bookmarks: Vec<Bookmark>,
    folder_colors: BTreeMap<String, MarkerColor>,
}

impl BookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    pub fn get(&self, id: BookmarkId) -> Result<&Bookmark, CoreError> {
        self.bookmarks
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| CoreError::not_found("Bookmark", id))
    }

    /// Every bookmark in insertion order.
    pub fn all(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn resolve_color(&self, folder: &str, explicit: Option<MarkerColor>) -> MarkerColor {
        explicit
            .or_else(|| self.folder_colors.get(folder).copied())
            .unwrap_or_default()
    }

    pub fn add(&mut self, input: NewBookmark) -> Result<&Bookmark, CoreError> {
        let name = validate_name(&input.name)?;
        let coordinates = input.coordinates.validated()?;
        let folder = normalize_folder(input.folder.as_deref());
        let color = self.resolve_color(&folder, input.color);

        self.bookmarks.push(Bookmark {
            id: uuid::Uuid::new_v4(),
            name,
            folder,
            description: input.description.trim().to_string(),
            address: input.address.trim().to_string(),
            coordinates,
            icon: input.icon,
            color,
            created_at: chrono::Utc::now(),
        });
        let idx = self.bookmarks.len() - 1;
        Ok(&self.bookmarks[idx])
    }

    /// Apply a partial edit. Validation happens before anything changes.
    pub fn update(&mut self, id: BookmarkId, patch: BookmarkPatch) -> Result<&Bookmark, CoreError> {
        let idx = self
            .bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| CoreError::not_found("Bookmark", id))?;

        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let folder = patch.folder.as_deref().map(|f| normalize_folder(Some(f)));
        let color = match (&folder, patch.color) {
            (_, Some(explicit)) => Some(explicit),
            (Some(new_folder), None) => Some(self.resolve_color(new_folder, None)),
            (None, None) => None,
        };

        let bookmark = &mut self.bookmarks[idx];
        if let Some(name) = name {
            bookmark.name = name;
        }
        if let Some(folder) = folder {
            bookmark.folder = folder;
        }
        if let Some(description) = patch.description {
            bookmark.description = description.trim().to_string();
        }
        if let Some(icon) = patch.icon {
            bookmark.icon = icon;
        }
        if let Some(color) = color {
            bookmark.color = color;
        }
        Ok(&self.bookmarks[idx])
    }

    pub fn delete(&mut self, id: BookmarkId) -> Result<Bookmark, CoreError> {
        let idx = self
            .bookmarks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| CoreError::not_found("Bookmark", id))?;
        Ok(self.bookmarks.remove(idx))
    }

    /// Remove every bookmark and every folder colour.
    pub fn clear(&mut self) -> usize {
        let removed = self.bookmarks.len();
        self.bookmarks.clear();
        self.folder_colors.clear();
        removed
    }

    /// Filtered, sorted view. Sorting is stable.
    pub fn list(&self, query: &ListQuery) -> Vec<&Bookmark> {
        let needle = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut view: Vec<&Bookmark> = self
            .bookmarks
            .iter()
            .filter(|b| query.folder.matches(&b.folder))
            .filter(|b| match &needle {
                Some(n) => {
                    b.name.to_lowercase().contains(n) || b.description.to_lowercase().contains(n)
                }
                None => true,
            })
            .collect();

        match query.sort {
            SortMethod::Name => view.sort_by(|a, b| a.name.cmp(&b.name)),
            SortMethod::Folder => {
                view.sort_by(|a, b| a.folder.cmp(&b.folder).then_with(|| a.name.cmp(&b.name)))
            }
            SortMethod::Recent => view.reverse(),
        }
        view
    }

    /// Sorted distinct folder names in use.
    pub fn folders(&self) -> Vec<String> {
        self.bookmarks
            .iter()
            .map(|b| b.folder.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Set the colour for a folder. Existing bookmarks keep their colour;
    /// it applies to bookmarks added or moved into the folder afterwards.
    pub fn set_folder_color(&mut self, folder: &str, color: MarkerColor) -> Result<(), CoreError> {
        let folder = folder.trim();
        if folder.is_empty() {
            return Err(CoreError::Validation(
                "Folder name must not be empty".to_string(),
            ));
        }
        self.folder_colors.insert(folder.to_string(), color);
        Ok(())
    }

    pub fn folder_color(&self, folder: &str) -> Option<MarkerColor> {
        self.folder_colors.get(folder).copied()
    }

    /// Configured colours, including folders no bookmark uses any more.
    pub fn folder_colors(&self) -> &BTreeMap<String, MarkerColor> {
        &self.folder_colors
    }
}
