#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use choir_api::config::ServerConfig;
use choir_api::router::build_app_router;
use choir_api::state::{AppState, Repositories};
use choir_core::catalog::{CatalogItem, Term};
use choir_core::skill::SkillPolicy;
use choir_core::types::DbId;

/// Members known to the test app.
pub const MEMBER: DbId = 1;
pub const OTHER_MEMBER: DbId = 2;

/// Number of lyrics seeded into the test catalog.
pub const LYRIC_COUNT: i64 = 25;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 1,
    }
}

/// Seed catalog: `Lyric 001` through `Lyric 025`, alternating between two
/// genres and two languages, with release years on even ids only.
pub fn seed_catalog() -> Vec<CatalogItem> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (1..=LYRIC_COUNT)
        .map(|id| {
            let (genre, language) = if id % 2 == 0 {
                ("sacred", "latin")
            } else {
                ("folk", "english")
            };
            CatalogItem {
                id,
                title: format!("Lyric {id:03}"),
                composer: Some(format!("Composer {}", id % 3)),
                language: Some(Term {
                    slug: language.to_string(),
                    name: language.to_string(),
                }),
                difficulty: Some((id % 5 + 1) as i16),
                genres: vec![Term {
                    slug: genre.to_string(),
                    name: genre.to_string(),
                }],
                year: (id % 2 == 0).then_some(1800 + id as i32),
                excerpt: None,
                date_added: base + Duration::days(id),
                last_modified: base + Duration::days(100 - id),
            }
        })
        .collect()
}

/// Build the full application router over in-memory repositories.
///
/// Each call returns a fresh store; clone the router to issue several
/// requests against the same state.
pub fn build_test_app() -> Router {
    build_test_app_with(seed_catalog(), SkillPolicy::default())
}

pub fn build_test_app_with(catalog: Vec<CatalogItem>, policy: SkillPolicy) -> Router {
    let config = test_config();
    let repos = Repositories::in_memory(catalog, [MEMBER, OTHER_MEMBER]);
    let state = AppState::new(config.clone(), repos, policy);
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log one session and return the parsed response body.
pub async fn log_practice(
    app: &Router,
    member_id: DbId,
    lyric_id: DbId,
    minutes: i32,
    confidence: Option<i16>,
) -> serde_json::Value {
    let body = serde_json::json!({
        "member_id": member_id,
        "lyric_id": lyric_id,
        "duration_minutes": minutes,
        "confidence": confidence,
    });
    let response = post_json(app.clone(), "/api/v1/practice", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}
