mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, get_auth, login, post_json, post_json_auth};
use serde_json::json;

// ---------------------------------------------------------------------------
// Login / registration
// ---------------------------------------------------------------------------

/// First login registers the account; the second logs in.
#[tokio::test]
async fn first_login_registers_then_logs_in() {
    let app = build_test_app();
    let body = json!({ "username": "jiwoo", "password": "hunter22" });

    let first = post_json(&app, "/api/v1/auth/login", body.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["outcome"], "registered");
    assert_eq!(first["username"], "jiwoo");
    assert!(first["access_token"].as_str().is_some());
    assert!(first["expires_in"].as_i64().unwrap() > 0);

    let second = body_json(post_json(&app, "/api/v1/auth/login", body).await).await;
    assert_eq!(second["outcome"], "loggedin");
}

/// Two users logging in at once both get working sessions.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_logins_of_different_users() {
    let app = build_test_app();
    let (a, b) = tokio::join!(
        login(&app, "jiwoo", "hunter22"),
        login(&app, "minseo", "letmein9"),
    );

    for token in [a, b] {
        let response = get_auth(&app, "/api/v1/bookmarks", &token).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(body_json(get(&app, "/health").await).await["accounts"], 2);
}

/// A known username with the wrong password is rejected.
#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = build_test_app();
    login(&app, "jiwoo", "hunter22").await;

    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({ "username": "jiwoo", "password": "wrong" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

/// Blank credentials are a validation error.
#[tokio::test]
async fn blank_credentials_are_rejected() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/api/v1/auth/login",
        json!({ "username": "   ", "password": "x" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Protected routes
// ---------------------------------------------------------------------------

/// Protected routes require a bearer token.
#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_test_app();
    let response = get(&app, "/api/v1/bookmarks").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A garbage token is rejected.
#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let app = build_test_app();
    let response = get_auth(&app, "/api/v1/bookmarks", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Logout revokes the token but keeps the account's data.
#[tokio::test]
async fn logout_revokes_session_and_keeps_data() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "hunter22").await;

    let created = post_json_auth(
        &app,
        "/api/v1/bookmarks",
        &token,
        json!({
            "name": "집",
            "location": { "kind": "coordinates", "lat": 37.5, "lng": 127.0 }
        }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let logout = post_json_auth(&app, "/api/v1/auth/logout", &token, json!({})).await;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let after = get_auth(&app, "/api/v1/bookmarks", &token).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);

    let fresh = login(&app, "jiwoo", "hunter22").await;
    let list = body_json(get_auth(&app, "/api/v1/bookmarks", &fresh).await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

/// Each account sees only its own bookmarks.
#[tokio::test]
async fn accounts_are_isolated() {
    let app = build_test_app();
    let alice = login(&app, "alice", "pw-alice").await;
    let bob = login(&app, "bob", "pw-bob").await;

    post_json_auth(
        &app,
        "/api/v1/bookmarks",
        &alice,
        json!({
            "name": "회사",
            "location": { "kind": "coordinates", "lat": 37.4, "lng": 127.1 }
        }),
    )
    .await;

    let bobs = body_json(get_auth(&app, "/api/v1/bookmarks", &bob).await).await;
    assert!(bobs["data"].as_array().unwrap().is_empty());
}
