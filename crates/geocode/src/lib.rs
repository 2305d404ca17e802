//! Address ⇄ coordinate lookup.
//!
//! [`Geocoder`] is the seam the API layer depends on; [`NominatimGeocoder`]
//! is the HTTP implementation. Lookups are single-shot: no retries and no
//! caching.

mod nominatim;

use async_trait::async_trait;
use serde::Serialize;

use atlasboard_core::types::Coordinates;

pub use nominatim::{parse_reverse_response, parse_search_response, NominatimGeocoder};

/// Result of a forward lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedPlace {
    /// Provider-formatted address.
    pub formatted_address: String,
    pub coordinates: Coordinates,
}

/// Result of a reverse lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseGeocoded {
    pub formatted_address: String,
}

/// Errors from the geocoding provider.
///
/// A lookup that simply finds nothing is `Ok(None)`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("Geocoder request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Geocoder API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The provider answered with a payload we could not interpret.
    #[error("Unexpected geocoder response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-form address to a single best match.
    async fn forward(&self, address: &str) -> Result<Option<GeocodedPlace>, GeocodeError>;

    /// Resolve a position to an address in `language` (e.g. `"ko"`).
    async fn reverse(
        &self,
        at: Coordinates,
        language: &str,
    ) -> Result<Option<ReverseGeocoded>, GeocodeError>;
}
