use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use shared_types::Grade;

use crate::common::{
    bulk_grades, create_sheet, patch_json, patch_raw, sheet_uri, staff_token, test_app, ASHA,
    BALA, CHITRA,
};

fn bulk_uri(year: i32, semester: i32) -> String {
    format!("{}/bulk", sheet_uri(year, semester))
}

#[tokio::test]
async fn bulk_update_patches_only_changed_cells() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;

    let (status, resp) = bulk_grades(
        &app,
        1,
        1,
        &[
            (ASHA, vec![("MA1101", "O"), ("PH1101", "NONE")]),
            (BALA, vec![("MA1101", "B+"), ("PH1101", "")]),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "Bulk update completed successfully");
    assert_eq!(resp["updatedStudents"], 2);
    assert_eq!(resp["newStudents"], 0);
    assert_eq!(resp["totalOperations"], 2);

    let sheet = app.snapshot(1, 1).unwrap();
    let asha = sheet.find_student(ASHA).unwrap();
    assert_eq!(asha.grades.get("MA1101"), Some(&Grade::O));
    assert_eq!(asha.grades.get("PH1101"), Some(&Grade::Ungraded));
    let bala = sheet.find_student(BALA).unwrap();
    assert_eq!(bala.grades.get("MA1101"), Some(&Grade::BPlus));
    let chitra = sheet.find_student(CHITRA).unwrap();
    assert!(chitra.grades.values().all(|g| !g.is_graded()));
}

#[tokio::test]
async fn bulk_update_appends_students_missing_from_roster() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;

    let body = serde_json::json!({
        "students": [
            { "registrationNumber": "212223104050", "name": "Lateral Entry", "grades": { "MA1101": "A" } }
        ]
    });
    let (status, resp) = patch_json(&app, &bulk_uri(1, 1), &body, Some(&staff_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["newStudents"], 1);
    assert_eq!(resp["updatedStudents"], 0);

    let sheet = app.snapshot(1, 1).unwrap();
    assert_eq!(sheet.roster.len(), 4);
    let added = sheet.find_student("212223104050").unwrap();
    assert_eq!(added.name, "Lateral Entry");
    assert_eq!(added.grades.get("MA1101"), Some(&Grade::A));
}

#[tokio::test]
async fn one_invalid_grade_blocks_the_whole_upload() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;
    let before = app.snapshot(1, 1).unwrap();

    let (status, resp) = bulk_grades(
        &app,
        1,
        1,
        &[
            (ASHA, vec![("MA1101", "O")]),
            (BALA, vec![("MA1101", "Q")]),
            (CHITRA, vec![("PH1101", "A")]),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["kind"], "ValidationError");
    let details = resp["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["registrationNumber"], BALA);
    assert_eq!(details[0]["subject"], "MA1101");
    assert_eq!(details[0]["grade"], "Q");

    assert_eq!(app.snapshot(1, 1).unwrap(), before);
}

#[tokio::test]
async fn rows_flagged_error_are_skipped() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;
    let before = app.snapshot(1, 1).unwrap();

    let body = serde_json::json!({
        "students": [
            { "registrationNumber": ASHA, "grades": { "MA1101": "???" }, "rowStatus": "error" }
        ]
    });
    let (status, resp) = patch_json(&app, &bulk_uri(1, 1), &body, Some(&staff_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "No changes to apply");
    assert_eq!(resp["totalOperations"], 0);
    assert_eq!(app.snapshot(1, 1).unwrap(), before);
}

#[tokio::test]
async fn reupload_of_same_grades_changes_nothing() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;
    bulk_grades(&app, 1, 1, &[(ASHA, vec![("MA1101", "A")])]).await;
    let before = app.snapshot(1, 1).unwrap();

    let (status, resp) = bulk_grades(&app, 1, 1, &[(ASHA, vec![("MA1101", "A")])]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "No changes to apply");
    assert_eq!(resp["updatedStudents"], 0);
    assert_eq!(app.snapshot(1, 1).unwrap().last_updated, before.last_updated);
}

#[tokio::test]
async fn bulk_update_on_missing_sheet_is_sheet_not_found() {
    let app = test_app();

    let (status, resp) = bulk_grades(&app, 3, 5, &[(ASHA, vec![("CS3501", "O")])]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["code"], "sheet_not_found");
}

#[tokio::test]
async fn malformed_upload_is_a_validation_error() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;

    let (status, resp) = patch_raw(&app, &bulk_uri(1, 1), "{\"students\": [", &staff_token()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["kind"], "ValidationError");
}

#[tokio::test]
async fn malformed_subject_keys_block_the_upload() {
    let app = test_app();
    create_sheet(&app, 1, 1).await;
    let before = app.snapshot(1, 1).unwrap();

    let (status, resp) = bulk_grades(
        &app,
        1,
        1,
        &[(ASHA, vec![("MA1101", "O"), (" ma1101 ", "A")])],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = resp["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["subject"], "ma1101");
    assert_eq!(app.snapshot(1, 1).unwrap(), before);
}
