use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use shared_types::Grade;

use crate::common::{create_sheet, patch_json, sheet_uri, staff_token, test_app, ASHA, BALA};

fn grade_uri(year: i32, semester: i32) -> String {
    format!("{}/grade", sheet_uri(year, semester))
}

fn cell(reg: &str, subject: &str, grade: &str) -> serde_json::Value {
    serde_json::json!({
        "registrationNumber": reg,
        "subjectCode": subject,
        "grade": grade,
    })
}

#[tokio::test]
async fn update_grade_writes_one_cell() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;
    let before = app.snapshot(1, 1).unwrap();

    let (status, resp) = patch_json(
        &app,
        &grade_uri(1, 1),
        &cell(ASHA, "MA1101", "A+"),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["success"], true);
    assert_eq!(resp["updatedFields"]["student"], ASHA);
    assert_eq!(resp["updatedFields"]["subject"], "MA1101");
    assert_eq!(resp["updatedFields"]["grade"], "A+");

    let after = app.snapshot(1, 1).unwrap();
    let asha = after.find_student(ASHA).unwrap();
    assert_eq!(asha.grades.get("MA1101"), Some(&Grade::APlus));
    assert_eq!(asha.grades.get("PH1101"), Some(&Grade::Ungraded));
    assert_eq!(after.find_student(BALA), before.find_student(BALA));
    assert!(after.last_updated >= before.last_updated);
}

#[tokio::test]
async fn update_grade_reports_every_bad_field() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;

    let (status, resp) = patch_json(
        &app,
        &grade_uri(1, 1),
        &cell("12345", "ma1101", "Z"),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["kind"], "ValidationError");
    let fields = resp["fieldErrors"].as_object().unwrap();
    assert!(fields.contains_key("registrationNumber"));
    assert!(fields.contains_key("subjectCode"));
    assert!(fields.contains_key("grade"));
}

#[tokio::test]
async fn update_grade_rejects_empty_grade() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;

    let (status, resp) = patch_json(
        &app,
        &grade_uri(1, 1),
        &cell(ASHA, "MA1101", ""),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["fieldErrors"]["grade"].as_str().is_some());
}

#[tokio::test]
async fn update_grade_on_missing_sheet_is_sheet_not_found() {
    let app = test_app();

    let (status, resp) = patch_json(
        &app,
        &grade_uri(2, 3),
        &cell(ASHA, "CS2301", "O"),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["code"], "sheet_not_found");
}

#[tokio::test]
async fn update_grade_for_unknown_student_is_student_not_found() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;

    let (status, resp) = patch_json(
        &app,
        &grade_uri(1, 1),
        &cell("212223104099", "MA1101", "O"),
        Some(&staff_token()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["code"], "student_not_found");

    let sheet = app.snapshot(1, 1).unwrap();
    assert!(sheet.find_student("212223104099").is_none());
}
