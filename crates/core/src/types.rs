use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Bookmarks are keyed by a random v4 UUID assigned at creation.
pub type BookmarkId = uuid::Uuid;

/// Uploaded datasets are keyed the same way.
pub type DatasetId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Selector values meaning "no filter" (`전체` in the Korean UI).
pub const ALL_SENTINELS: &[&str] = &["전체", "all"];

/// `true` for `전체` / `all` (case-insensitive, surrounding whitespace ignored).
pub fn is_all_sentinel(value: &str) -> bool {
    let value = value.trim();
    ALL_SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(value))
}

/// A WGS84 latitude/longitude pair.
///
/// Construct through [`Coordinates::new`] so that every stored pair is a
/// finite, in-range position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoreError::Validation(
                "Coordinates must be finite numbers".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::Validation(format!(
                "Latitude {lat} is outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoreError::Validation(format!(
                "Longitude {lng} is outside -180..=180"
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Re-check a pair that arrived through deserialization.
    pub fn validated(self) -> Result<Self, CoreError> {
        Self::new(self.lat, self.lng)
    }
}
