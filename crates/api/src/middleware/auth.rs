//! Session extractor for the protected routes.

use std::sync::Arc;

use atlasboard_core::error::CoreError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tokio::sync::Mutex;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::session::UserState;
use crate::state::AppState;

/// The logged-in account behind a request, resolved from
/// `Authorization: Bearer <token>`.
///
/// Resolution fails with 401 when the header is missing or malformed, the
/// token does not verify, or its session was logged out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    /// `jti` of the presented token.
    pub session_key: String,
    /// Bookmarks, map state and datasets of this account.
    pub user_state: Arc<Mutex<UserState>>,
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_owned()))
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Authorization header is not valid text"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized("Expected: Authorization: Bearer <token>"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let live = state
            .accounts
            .session_is_active(&claims.jti, &claims.sub)
            .await;
        if !live {
            tracing::debug!(user = %claims.sub, "rejected token of a closed session");
            return Err(unauthorized("Session has been revoked"));
        }

        let Some(user_state) = state.accounts.user_state(&claims.sub).await else {
            return Err(unauthorized("Account no longer exists"));
        };

        Ok(Self {
            username: claims.sub,
            session_key: claims.jti,
            user_state,
        })
    }
}
