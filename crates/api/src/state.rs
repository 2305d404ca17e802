use std::sync::Arc;

use atlasboard_geocode::Geocoder;

use crate::config::ServerConfig;
use crate::session::AccountRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Accounts, sessions, and per-user bookmark/map/dataset state.
    pub accounts: Arc<AccountRegistry>,
    /// Address lookup provider.
    pub geocoder: Arc<dyn Geocoder>,
}
