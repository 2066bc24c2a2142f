use axum::http::StatusCode;

use crate::common::{get, test_app};

#[tokio::test]
async fn health_reports_repository_status() {
    let app = test_app();

    let (status, resp) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["db"], "connected");
    assert!(resp["version"].as_str().is_some());
}

#[tokio::test]
async fn docs_are_served_without_a_token() {
    let app = test_app();

    let (status, _) = get(&app, "/docs", None).await;
    assert_eq!(status, StatusCode::OK);
}
