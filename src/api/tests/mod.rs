use super::*;
use crate::types::UserId;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;


/// Database on a temp file plus default config
async fn create_test_state() -> (Arc<Database>, Arc<Config>, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
    (db, Arc::new(Config::default()), temp_file)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_server_stops_on_shutdown_signal() {
    let (db, config, _temp_file) = create_test_state().await;
    let mut config = (*config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(start_api_server(db, Arc::new(config), shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_headers_present_for_wildcard() {
    let (db, config, _temp_file) = create_test_state().await;
    let app = create_router(db, config);

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_api_key_guards_all_routes() {
    let (db, config, _temp_file) = create_test_state().await;
    db.touch_user(UserId(1), None).await.unwrap();
    let mut config = (*config).clone();
    config.server.api.api_key = Some("test-secret-key".to_string());
    let app = create_router(db, Arc::new(config));

    let (status, _) = get_json(app.clone(), "/api/v1/users/1/videos").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/1/videos")
                .header("X-Api-Key", "test-secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_paths_are_404() {
    let (db, config, _temp_file) = create_test_state().await;
    let app = create_router(db, config);

    let (status, _) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
