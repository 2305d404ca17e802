use atlasboard_core::error::CoreError;
use atlasboard_geocode::GeocodeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`GeocodeError`] for provider
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`]
/// to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `atlasboard_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The geocoding provider could not be reached or answered badly.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The geocoder found no match for the given address.
    #[error("No geocoding result for '{0}'")]
    GeocodeMiss(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type ErrorParts = (StatusCode, &'static str, String);

fn hidden(detail: &str) -> ErrorParts {
    tracing::error!(error = %detail, "request failed internally");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_owned(),
    )
}

/// Status, machine code and client message for a domain error.
fn core_parts(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        // Valid request, but nothing to draw or nothing decodable.
        CoreError::EmptySelection(msg) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_SELECTION", msg.clone())
        }
        CoreError::Decode(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_FAILURE", msg.clone()),
        CoreError::Internal(msg) => hidden(msg),
    }
}

impl AppError {
    fn parts(&self) -> ErrorParts {
        match self {
            AppError::Core(core) => core_parts(core),
            AppError::Geocode(err) => {
                tracing::warn!(error = %err, "geocoder call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "GEOCODER_UNAVAILABLE",
                    "The geocoding service is unavailable".to_owned(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::GeocodeMiss(_) => (StatusCode::NOT_FOUND, "GEOCODE_MISS", self.to_string()),
            AppError::InternalError(msg) => hidden(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}
