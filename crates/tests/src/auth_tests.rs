use axum::{
    body::Body,
    http::{Request, StatusCode},
};

use crate::common::{
    get, post_json, send, sheet_uri, student_token, test_app, token_for, BATCH, DEPARTMENT,
};

fn create_body() -> serde_json::Value {
    serde_json::json!({
        "batch": BATCH,
        "department": DEPARTMENT,
        "yearNumber": 1,
        "semester": 1,
        "examCycle": "NOV/DEC 2023",
    })
}

#[tokio::test]
async fn reads_require_a_token() {
    let app = test_app();

    let (status, resp) = get(&app, &sheet_uri(1, 1), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["kind"], "Unauthorized");
}

#[tokio::test]
async fn invalid_token_is_treated_as_anonymous() {
    let app = test_app();

    let req = Request::builder()
        .method("GET")
        .uri(sheet_uri(1, 1))
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn students_cannot_generate_sheets() {
    let app = test_app();

    let (status, resp) = post_json(
        &app,
        "/api/result-sheets",
        &create_body(),
        Some(&student_token()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["kind"], "Forbidden");
    assert!(app.snapshot(1, 1).is_none());
}

#[tokio::test]
async fn admin_role_counts_as_staff() {
    let app = test_app();

    let (status, _) = post_json(
        &app,
        "/api/result-sheets",
        &create_body(),
        Some(&token_for("Admin")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
