//! Handlers for the `/auth` resource (login, logout).

use atlasboard_core::error::CoreError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::issue_session_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::session::LoginOutcome;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub username: String,
    /// Whether this login created the account.
    pub outcome: LoginOutcome,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Log in, or register when the username is new. Returns an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let username = input.username.trim();
    if username.is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username and password are required".into(),
        )));
    }

    let outcome = state
        .accounts
        .login_or_register(username, &input.password)
        .await?;

    let issued = issue_session_token(username, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    state
        .accounts
        .open_session(issued.session_key, username, issued.expires_at)
        .await;

    tracing::info!(user = %username, ?outcome, "User logged in");

    Ok(Json(AuthResponse {
        access_token: issued.token,
        expires_in: issued.expires_in,
        username: username.to_string(),
        outcome,
    }))
}

/// POST /api/v1/auth/logout
///
/// Revoke the caller's session. Bookmarks and datasets are kept.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    state.accounts.revoke_session(&auth.session_key).await;
    tracing::info!(user = %auth.username, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}
