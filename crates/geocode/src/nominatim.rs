//! Nominatim (OpenStreetMap) HTTP client.

use async_trait::async_trait;
use serde::Deserialize;

use atlasboard_core::types::Coordinates;

use crate::{GeocodeError, GeocodedPlace, Geocoder, ReverseGeocoded};

/// HTTP client for a Nominatim-compatible endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

/// One entry of a `jsonv2` search or reverse response. Nominatim encodes
/// coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseBody {
    Miss { error: serde_json::Value },
    Hit(Place),
}

impl NominatimGeocoder {
    /// * `base_url` - e.g. `https://nominatim.openstreetmap.org`.
    /// * `user_agent` - sent on every request; the public instance rejects
    ///   anonymous clients.
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, user_agent)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, GeocodeError> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn forward(&self, address: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        let body = self
            .get_text(
                "search",
                &[
                    ("q", address.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        let place = parse_search_response(&body)?;
        tracing::debug!(address, found = place.is_some(), "Forward geocode");
        Ok(place)
    }

    async fn reverse(
        &self,
        at: Coordinates,
        language: &str,
    ) -> Result<Option<ReverseGeocoded>, GeocodeError> {
        let body = self
            .get_text(
                "reverse",
                &[
                    ("lat", at.lat.to_string()),
                    ("lon", at.lng.to_string()),
                    ("format", "jsonv2".to_string()),
                    ("accept-language", language.to_string()),
                ],
            )
            .await?;
        let place = parse_reverse_response(&body)?;
        tracing::debug!(lat = at.lat, lng = at.lng, found = place.is_some(), "Reverse geocode");
        Ok(place)
    }
}

fn to_place(place: Place) -> Result<GeocodedPlace, GeocodeError> {
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| GeocodeError::Decode(format!("non-numeric coordinate '{s}'")))
    };
    let coordinates = Coordinates::new(parse(&place.lat)?, parse(&place.lon)?)
        .map_err(|e| GeocodeError::Decode(e.to_string()))?;
    Ok(GeocodedPlace {
        formatted_address: place.display_name,
        coordinates,
    })
}

/// Interpret a `/search?format=jsonv2` body. An empty array is a miss.
pub fn parse_search_response(body: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(e.to_string()))?;
    places.into_iter().next().map(to_place).transpose()
}

/// Interpret a `/reverse?format=jsonv2` body. `{"error": ...}` is a miss.
pub fn parse_reverse_response(body: &str) -> Result<Option<ReverseGeocoded>, GeocodeError> {
    let parsed: ReverseBody =
        serde_json::from_str(body).map_err(|e| GeocodeError::Decode(e.to_string()))?;
    match parsed {
        ReverseBody::Miss { error } => {
            tracing::debug!(%error, "Reverse geocode miss");
            Ok(None)
        }
        ReverseBody::Hit(place) => Ok(Some(ReverseGeocoded {
            formatted_address: place.display_name,
        })),
    }
}
