#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use atlasboard_api::auth::jwt::JwtConfig;
use atlasboard_api::config::{GeocoderConfig, ServerConfig};
use atlasboard_api::router::build_app_router;
use atlasboard_api::session::AccountRegistry;
use atlasboard_api::state::AppState;
use atlasboard_core::types::Coordinates;
use atlasboard_geocode::{GeocodeError, GeocodedPlace, Geocoder, ReverseGeocoded};

pub const CITY_HALL: &str = "서울특별시 중구 세종대로 110";
pub const CITY_HALL_FORMATTED: &str = "서울특별시청, 110, 세종대로, 중구, 서울특별시, 대한민국";
pub const CLICK_ADDRESS: &str = "태평로1가, 중구, 서울특별시, 대한민국";
const MULTIPART_BOUNDARY: &str = "atlasboard-test-boundary";

// ---------------------------------------------------------------------------
// Geocoder double
// ---------------------------------------------------------------------------

/// Canned geocoder: known addresses resolve, everything else misses.
pub struct StaticGeocoder {
    places: HashMap<String, GeocodedPlace>,
    reverse_address: Option<String>,
    unavailable: bool,
}

impl StaticGeocoder {
    pub fn seoul() -> Self {
        let mut places = HashMap::new();
        places.insert(
            CITY_HALL.to_string(),
            GeocodedPlace {
                formatted_address: CITY_HALL_FORMATTED.to_string(),
                coordinates: Coordinates::new(37.5666791, 126.9782914).unwrap(),
            },
        );
        Self {
            places,
            reverse_address: Some(CLICK_ADDRESS.to_string()),
            unavailable: false,
        }
    }

    /// Every lookup fails as if the provider were down.
    pub fn unavailable() -> Self {
        Self {
            places: HashMap::new(),
            reverse_address: None,
            unavailable: true,
        }
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn forward(&self, address: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        if self.unavailable {
            return Err(GeocodeError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self.places.get(address).cloned())
    }

    async fn reverse(
        &self,
        _at: Coordinates,
        _language: &str,
    ) -> Result<Option<ReverseGeocoded>, GeocodeError> {
        if self.unavailable {
            return Err(GeocodeError::Decode("unavailable".into()));
        }
        Ok(self
            .reverse_address
            .clone()
            .map(|formatted_address| ReverseGeocoded { formatted_address }))
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        cluster_threshold: 3,
        geocoder: GeocoderConfig {
            url: "http://geocoder.invalid".to_string(),
            user_agent: "atlasboard-test".to_string(),
            language: "ko".to_string(),
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router (same middleware stack as production)
/// around the given geocoder.
pub fn build_test_app_with(geocoder: impl Geocoder + 'static) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        accounts: Arc::new(AccountRegistry::new()),
        geocoder: Arc::new(geocoder),
    };
    build_app_router(state, &config)
}

pub fn build_test_app() -> Router {
    build_test_app_with(StaticGeocoder::seoul())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(t) => builder.header(header::AUTHORIZATION, format!("Bearer {t}")),
        None => builder,
    }
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, Some(token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn put_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        builder(Method::PUT, uri, Some(token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_text_auth(app: &Router, uri: &str, token: &str, body: String) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, Some(token))
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// POST a multipart form with a single `file` field.
pub async fn upload_auth(
    app: &Router,
    uri: &str,
    token: &str,
    file_name: &str,
    bytes: &[u8],
) -> Response<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        builder(Method::POST, uri, Some(token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Log in (registering on first use) and return the access token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
