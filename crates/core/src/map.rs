//! Map view state and marker layout.

use serde::Serialize;

use crate::bookmark::{BookmarkStore, Icon, ListQuery, MarkerColor};
use crate::types::{BookmarkId, Coordinates};

/// Seoul City Hall.
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 37.5665,
    lng: 126.9780,
};

pub const DEFAULT_ZOOM: u8 = 16;

/// Address stored for click-created bookmarks when reverse lookup yields nothing.
pub const CLICK_ADDRESS_FALLBACK: &str = "(지도 클릭 입력)";

/// Per-session map state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapState {
    pub center: Option<Coordinates>,
    pub last_viewed: Option<BookmarkId>,
    pub last_click: Option<Coordinates>,
}

impl MapState {
    /// Replace the previous click. Only the latest one is kept.
    pub fn record_click(&mut self, at: Coordinates) {
        self.last_click = Some(at);
    }

    pub fn view_bookmark(&mut self, id: BookmarkId, at: Coordinates) {
        self.last_viewed = Some(id);
        self.center = Some(at);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub bookmark_id: BookmarkId,
    pub position: Coordinates,
    pub icon: Icon,
    pub color: MarkerColor,
    /// HTML fragment; user text is escaped.
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    pub markers: Vec<Marker>,
    pub clustered: bool,
    pub last_click: Option<Coordinates>,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the map view for the bookmarks passing `query`.
///
/// The centre is the last viewed bookmark if it still exists, then the
/// stored centre, then [`DEFAULT_CENTER`]. Markers cluster once their
/// count reaches `cluster_threshold`.
pub fn build_map_view(
    store: &BookmarkStore,
    query: &ListQuery,
    state: &MapState,
    cluster_threshold: usize,
) -> MapView {
    let center = state
        .last_viewed
        .and_then(|id| store.get(id).ok())
        .map(|b| b.coordinates)
        .or(state.center)
        .unwrap_or(DEFAULT_CENTER);

    let markers: Vec<Marker> = store
        .list(query)
        .into_iter()
        .map(|b| Marker {
            bookmark_id: b.id,
            position: b.coordinates,
            icon: b.icon,
            color: b.color,
            popup: format!(
                "<b>{}</b><br>{}<br><i>{}</i><br>폴더: {}",
                escape_html(&b.name),
                escape_html(&b.address),
                escape_html(&b.description),
                escape_html(&b.folder),
            ),
        })
        .collect();

    MapView {
        center,
        zoom: DEFAULT_ZOOM,
        clustered: markers.len() >= cluster_threshold,
        markers,
        last_click: state.last_click,
    }
}
