mod common;

use axum::http::{header, StatusCode};
use common::{
    body_bytes, body_json, build_test_app, build_test_app_with, delete_auth, get_auth, login,
    post_json_auth, post_text_auth, put_json_auth, StaticGeocoder, CITY_HALL,
    CITY_HALL_FORMATTED, CLICK_ADDRESS,
};
use serde_json::{json, Value};

async fn create(app: &axum::Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app, "/api/v1/bookmarks", token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

fn at(name: &str, folder: &str, lat: f64, lng: f64) -> Value {
    json!({
        "name": name,
        "folder": folder,
        "location": { "kind": "coordinates", "lat": lat, "lng": lng }
    })
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Coordinates without an address get the placeholder address and the
/// default folder, icon and colour.
#[tokio::test]
async fn create_by_coordinates_applies_defaults() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;

    let bookmark = create(
        &app,
        &token,
        json!({
            "name": "  남산타워  ",
            "location": { "kind": "coordinates", "lat": 37.5512, "lng": 126.9882 }
        }),
    )
    .await;

    assert_eq!(bookmark["name"], "남산타워");
    assert_eq!(bookmark["folder"], "기본");
    assert_eq!(bookmark["icon"], "info-sign");
    assert_eq!(bookmark["color"], "blue");
    assert_eq!(bookmark["address"], "(지도 클릭 입력)");
    assert_eq!(bookmark["coordinates"]["lat"], 37.5512);
}

/// An address is forward-geocoded and the formatted address is stored.
#[tokio::test]
async fn create_by_address_geocodes() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;

    let bookmark = create(
        &app,
        &token,
        json!({
            "name": "시청",
            "folder": "관공서",
            "location": { "kind": "address", "address": CITY_HALL }
        }),
    )
    .await;

    assert_eq!(bookmark["address"], CITY_HALL_FORMATTED);
    assert_eq!(bookmark["coordinates"]["lat"], 37.5666791);
    assert_eq!(bookmark["folder"], "관공서");
}

/// A geocoding miss stores nothing.
#[tokio::test]
async fn geocode_miss_stores_nothing() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;

    let response = post_json_auth(
        &app,
        "/api/v1/bookmarks",
        &token,
        json!({
            "name": "어딘가",
            "location": { "kind": "address", "address": "존재하지 않는 주소 999" }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "GEOCODE_MISS");

    let list = body_json(get_auth(&app, "/api/v1/bookmarks", &token).await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

/// A provider outage on forward lookup is a 502, not a miss.
#[tokio::test]
async fn geocoder_outage_is_bad_gateway() {
    let app = build_test_app_with(StaticGeocoder::unavailable());
    let token = login(&app, "jiwoo", "pw").await;

    let response = post_json_auth(
        &app,
        "/api/v1/bookmarks",
        &token,
        json!({
            "name": "시청",
            "location": { "kind": "address", "address": CITY_HALL }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "GEOCODER_UNAVAILABLE");
}

/// A blank name fails validation before the geocoder is asked.
#[tokio::test]
async fn blank_name_skips_geocoding() {
    let app = build_test_app_with(StaticGeocoder::unavailable());
    let token = login(&app, "jiwoo", "pw").await;

    let response = post_json_auth(
        &app,
        "/api/v1/bookmarks",
        &token,
        json!({
            "name": "  ",
            "location": { "kind": "address", "address": CITY_HALL }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

/// Empty names and out-of-range coordinates are rejected.
#[tokio::test]
async fn invalid_input_is_rejected() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;

    let blank = post_json_auth(&app, "/api/v1/bookmarks", &token, at("   ", "기본", 37.0, 127.0)).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let far = post_json_auth(&app, "/api/v1/bookmarks", &token, at("북극", "기본", 91.0, 0.0)).await;
    assert_eq!(far.status(), StatusCode::BAD_REQUEST);
}

/// `last_click` uses the recorded click and its reverse-geocoded address.
#[tokio::test]
async fn create_from_last_click() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;

    let location = json!({ "name": "클릭", "location": { "kind": "last_click" } });
    let before = post_json_auth(&app, "/api/v1/bookmarks", &token, location.clone()).await;
    assert_eq!(before.status(), StatusCode::BAD_REQUEST);

    let click = post_json_auth(
        &app,
        "/api/v1/map/click",
        &token,
        json!({ "lat": 37.5665, "lng": 126.978 }),
    )
    .await;
    assert_eq!(click.status(), StatusCode::OK);
    assert_eq!(body_json(click).await["data"]["address"], CLICK_ADDRESS);

    let bookmark = create(&app, &token, location).await;
    assert_eq!(bookmark["address"], CLICK_ADDRESS);
    assert_eq!(bookmark["coordinates"]["lng"], 126.978);
}

/// A failing reverse lookup falls back to the placeholder address.
#[tokio::test]
async fn click_survives_reverse_geocoder_failure() {
    let app = build_test_app_with(StaticGeocoder::unavailable());
    let token = login(&app, "jiwoo", "pw").await;

    let click = post_json_auth(
        &app,
        "/api/v1/map/click",
        &token,
        json!({ "lat": 35.1, "lng": 129.0 }),
    )
    .await;
    assert_eq!(click.status(), StatusCode::OK);
    assert_eq!(body_json(click).await["data"]["address"], "(지도 클릭 입력)");

    let map = body_json(get_auth(&app, "/api/v1/map", &token).await).await;
    assert_eq!(map["data"]["last_click"]["lat"], 35.1);
}

// ---------------------------------------------------------------------------
// List, filter, sort
// ---------------------------------------------------------------------------

/// The `전체` folder means no folder filter; `q` matches case-insensitively.
#[tokio::test]
async fn folder_filter_and_search() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;
    create(&app, &token, at("Cafe Onion", "카페", 37.54, 127.05)).await;
    create(&app, &token, at("회사", "업무", 37.50, 127.03)).await;
    create(&app, &token, at("Blue Bottle", "카페", 37.58, 126.98)).await;

    let all = body_json(get_auth(&app, "/api/v1/bookmarks?folder=%EC%A0%84%EC%B2%B4", &token).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 3);

    let cafes = body_json(get_auth(&app, "/api/v1/bookmarks?folder=%EC%B9%B4%ED%8E%98", &token).await).await;
    assert_eq!(cafes["data"].as_array().unwrap().len(), 2);

    let search = body_json(get_auth(&app, "/api/v1/bookmarks?q=onion", &token).await).await;
    let names: Vec<&str> = search["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cafe Onion"]);
}

/// Default sort is newest first; `name` sorts alphabetically.
#[tokio::test]
async fn sort_orders() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;
    create(&app, &token, at("b", "기본", 37.1, 127.0)).await;
    create(&app, &token, at("a", "기본", 37.2, 127.0)).await;
    create(&app, &token, at("c", "기본", 37.3, 127.0)).await;

    let names = |v: Value| -> Vec<String> {
        v["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["name"].as_str().unwrap().to_string())
            .collect()
    };

    let recent = body_json(get_auth(&app, "/api/v1/bookmarks", &token).await).await;
    assert_eq!(names(recent), vec!["c", "a", "b"]);

    let by_name = body_json(get_auth(&app, "/api/v1/bookmarks?sort=name", &token).await).await;
    assert_eq!(names(by_name), vec!["a", "b", "c"]);

    let bad = get_auth(&app, "/api/v1/bookmarks?sort=random", &token).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Update, delete, clear
// ---------------------------------------------------------------------------

/// Moving a bookmark into a coloured folder adopts the folder colour.
#[tokio::test]
async fn update_and_folder_colours() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;
    let bookmark = create(&app, &token, at("집", "기본", 37.5, 127.0)).await;
    let id = bookmark["id"].as_str().unwrap();

    let colour = put_json_auth(
        &app,
        "/api/v1/folders/%EC%97%AC%ED%96%89/color",
        &token,
        json!({ "color": "green" }),
    )
    .await;
    assert_eq!(colour.status(), StatusCode::OK);

    let updated = put_json_auth(
        &app,
        &format!("/api/v1/bookmarks/{id}"),
        &token,
        json!({ "folder": "여행", "description": "주말" }),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = body_json(updated).await["data"].clone();
    assert_eq!(updated["folder"], "여행");
    assert_eq!(updated["color"], "green");
    assert_eq!(updated["description"], "주말");

    let folders = body_json(get_auth(&app, "/api/v1/folders", &token).await).await;
    let travel = folders["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "여행")
        .unwrap()
        .clone();
    assert_eq!(travel["bookmark_count"], 1);
    assert_eq!(travel["color"], "green");
}

/// Delete removes one bookmark; a second delete is 404.
#[tokio::test]
async fn delete_bookmark() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;
    let bookmark = create(&app, &token, at("집", "기본", 37.5, 127.0)).await;
    let uri = format!("/api/v1/bookmarks/{}", bookmark["id"].as_str().unwrap());

    assert_eq!(delete_auth(&app, &uri, &token).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(delete_auth(&app, &uri, &token).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_auth(&app, &uri, &token).await.status(), StatusCode::NOT_FOUND);
}

/// Clear empties the store, drops folder colours and resets the map.
#[tokio::test]
async fn clear_resets_everything() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;
    create(&app, &token, at("a", "카페", 37.1, 127.0)).await;
    create(&app, &token, at("b", "카페", 37.2, 127.0)).await;
    put_json_auth(
        &app,
        "/api/v1/folders/%EC%B9%B4%ED%8E%98/color",
        &token,
        json!({ "color": "red" }),
    )
    .await;

    let cleared = body_json(delete_auth(&app, "/api/v1/bookmarks", &token).await).await;
    assert_eq!(cleared["data"]["count"], 2);

    let list = body_json(get_auth(&app, "/api/v1/bookmarks", &token).await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
    let folders = body_json(get_auth(&app, "/api/v1/folders", &token).await).await;
    assert!(folders["data"].as_array().unwrap().is_empty());

    let map = body_json(get_auth(&app, "/api/v1/map", &token).await).await;
    assert_eq!(map["data"]["center"]["lat"], 37.5665);
}

// ---------------------------------------------------------------------------
// Map view
// ---------------------------------------------------------------------------

/// Viewing a bookmark centres the map on it; clustering follows the
/// configured threshold.
#[tokio::test]
async fn view_and_clustering() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;
    let first = create(&app, &token, at("a", "기본", 35.1, 129.0)).await;
    create(&app, &token, at("b", "기본", 35.2, 129.1)).await;

    let view = post_json_auth(
        &app,
        &format!("/api/v1/bookmarks/{}/view", first["id"].as_str().unwrap()),
        &token,
        json!({}),
    )
    .await;
    let view = body_json(view).await["data"].clone();
    assert_eq!(view["center"]["lat"], 35.1);
    assert_eq!(view["markers"].as_array().unwrap().len(), 2);
    assert_eq!(view["clustered"], false);

    create(&app, &token, at("c", "기본", 35.3, 129.2)).await;
    let map = body_json(get_auth(&app, "/api/v1/map", &token).await).await;
    assert_eq!(map["data"]["clustered"], true);
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

/// Exported CSV imports back into an empty account.
#[tokio::test]
async fn export_then_import() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;
    create(&app, &token, at("집, 본가", "가족", 37.123456, 127.654321)).await;
    create(&app, &token, at("회사", "업무", 37.5, 127.0)).await;

    let export = get_auth(&app, "/api/v1/bookmarks/export", &token).await;
    assert_eq!(export.status(), StatusCode::OK);
    assert!(export.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("bookmarks.csv"));
    let csv = String::from_utf8(body_bytes(export).await).unwrap();
    assert!(csv.contains("37.123456, 127.654321"));

    let other = login(&app, "minsu", "pw").await;
    let imported = post_text_auth(&app, "/api/v1/bookmarks/import", &other, csv).await;
    assert_eq!(imported.status(), StatusCode::CREATED);
    assert_eq!(body_json(imported).await["data"]["count"], 2);

    let list = body_json(get_auth(&app, "/api/v1/bookmarks?sort=name", &other).await).await;
    let first = &list["data"][0];
    assert_eq!(first["name"], "집, 본가");
    assert_eq!(first["folder"], "가족");
}

/// A malformed row rejects the whole import and names the line.
#[tokio::test]
async fn import_is_all_or_nothing() {
    let app = build_test_app();
    let token = login(&app, "jiwoo", "pw").await;

    let csv = "name,coordinates\n좋음,\"37.1, 127.1\"\n나쁨,not-coords\n".to_string();
    let response = post_text_auth(&app, "/api/v1/bookmarks/import", &token, csv).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Line 3:"), "{error}");

    let list = body_json(get_auth(&app, "/api/v1/bookmarks", &token).await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}
