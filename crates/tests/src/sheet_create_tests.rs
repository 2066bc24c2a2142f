use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{
    create_sheet, post_json, staff_token, test_app, ASHA, BALA, BATCH, CHITRA, DEPARTMENT,
};

fn create_body(year: i32, semester: i32, overwrite: bool) -> serde_json::Value {
    serde_json::json!({
        "batch": BATCH,
        "department": DEPARTMENT,
        "yearNumber": year,
        "semester": semester,
        "examCycle": "NOV/DEC 2023",
        "overwrite": overwrite,
    })
}

#[tokio::test]
async fn create_sheet_builds_empty_roster_without_ncc_subjects() {
    let app = test_app();

    let resp = create_sheet(&app, 1, 1).await;
    assert_eq!(resp["batch"], BATCH);
    assert_eq!(resp["department"], DEPARTMENT);
    assert_eq!(resp["year"], "I");
    assert_eq!(resp["semester"], 1);
    assert!(resp["sheetId"].as_str().is_some());

    let roster = resp["roster"].as_array().unwrap();
    let regs: Vec<&str> = roster
        .iter()
        .map(|s| s["registrationNumber"].as_str().unwrap())
        .collect();
    assert_eq!(regs, vec![ASHA, BALA, CHITRA]);

    let grades = roster[0]["grades"].as_object().unwrap();
    let codes: Vec<&str> = grades.keys().map(String::as_str).collect();
    assert_eq!(codes, vec!["MA1101", "PH1101"]);
    assert!(grades.values().all(|g| g == ""));
}

#[tokio::test]
async fn create_sheet_twice_conflicts() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;

    let (status, resp) = post_json(
        &app,
        "/api/result-sheets",
        &create_body(1, 1, false),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["kind"], "Conflict");
}

#[tokio::test]
async fn overwrite_replaces_sheet_and_picks_up_new_students() {
    let app = test_app();
    let first = create_sheet(&app, 1, 1).await;

    app.reference
        .add_student(BATCH, DEPARTMENT, "212223104004", "Deepa");

    let (status, resp) = post_json(
        &app,
        "/api/result-sheets",
        &create_body(1, 1, true),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(resp["sheetId"], first["sheetId"]);
    assert_eq!(resp["roster"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn create_sheet_rejects_out_of_range_semester() {
    let app = test_app();

    let (status, resp) = post_json(
        &app,
        "/api/result-sheets",
        &create_body(1, 9, false),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["kind"], "ValidationError");
    assert!(resp["fieldErrors"]["semester"].as_str().is_some());
    assert!(app.snapshot(1, 9).is_none());
}

#[tokio::test]
async fn create_sheet_rejects_malformed_body() {
    let app = test_app();

    let (status, resp) = post_json(
        &app,
        "/api/result-sheets",
        &serde_json::json!({ "batch": BATCH }),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["kind"], "ValidationError");
    assert!(resp["fieldErrors"]["body"].as_str().is_some());
}
