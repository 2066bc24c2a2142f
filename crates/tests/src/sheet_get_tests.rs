use axum::http::StatusCode;

use crate::common::{
    bulk_grades, create_sheet, get, sheet_uri, student_token, test_app, ASHA, BATCH, DEPARTMENT,
};

#[tokio::test]
async fn get_sheet_returns_sorted_roster_with_grades() {
    let app = test_app();
    create_sheet(&app, 1, 2).await;
    let (status, _) = bulk_grades(&app, 1, 2, &[(ASHA, vec![("CS1201", "A+")])]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, resp) = get(&app, &sheet_uri(1, 2), Some(&student_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["year"], "I");
    assert_eq!(resp["semester"], 2);
    assert_eq!(resp["roster"][0]["registrationNumber"], ASHA);
    assert_eq!(resp["roster"][0]["grades"]["CS1201"], "A+");
    assert_eq!(resp["roster"][0]["grades"]["MA1201"], "");
    assert!(resp["lastUpdated"].as_str().is_some());
}

#[tokio::test]
async fn get_missing_sheet_is_sheet_not_found() {
    let app = test_app();

    let (status, resp) = get(&app, &sheet_uri(4, 8), Some(&student_token())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["kind"], "NotFound");
    assert_eq!(resp["code"], "sheet_not_found");
}

#[tokio::test]
async fn list_sheets_returns_cohort_summaries() {
    let app = test_app();
    create_sheet(&app, 1, 2).await;
    create_sheet(&app, 1, 1).await;

    let uri = format!("/api/result-sheets?batch={BATCH}&department={DEPARTMENT}");
    let (status, resp) = get(&app, &uri, Some(&student_token())).await;
    assert_eq!(status, StatusCode::OK);

    let sheets = resp.as_array().unwrap();
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0]["semester"], 1);
    assert_eq!(sheets[1]["semester"], 2);
    assert_eq!(sheets[0]["studentCount"], 3);

    let (status, resp) = get(
        &app,
        &format!("/api/result-sheets?batch={BATCH}&department=ECE"),
        Some(&student_token()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp.as_array().unwrap().len(), 0);
}
