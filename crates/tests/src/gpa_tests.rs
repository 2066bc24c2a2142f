use axum::http::StatusCode;
use shared_types::{CreditPolicy, GradingConfig, DEFAULT_SUBJECT_CREDIT};

use crate::common::{post_json, student_token, test_app, test_app_with_grading, DEPARTMENT};

fn gpa_body(grades: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "department": DEPARTMENT,
        "semester": 1,
        "grades": grades,
    })
}

#[tokio::test]
async fn strict_policy_skips_subjects_without_credits() {
    let app = test_app();

    let body = gpa_body(serde_json::json!({ "MA1101": "O", "PH1101": "B", "XX9999": "A" }));
    let (status, resp) = post_json(&app, "/api/results/gpa", &body, Some(&student_token())).await;
    assert_eq!(status, StatusCode::OK);
    // (10*4 + 6*3) / 7
    assert_eq!(resp["gpa"].as_f64().unwrap(), 8.29);
    assert_eq!(resp["countedSubjects"], 2);
    assert_eq!(resp["creditPolicy"], "strict");
}

#[tokio::test]
async fn default_credit_policy_counts_unknown_subjects() {
    let app = test_app_with_grading(GradingConfig {
        credit_policy: CreditPolicy::DefaultCredits,
        default_credit: DEFAULT_SUBJECT_CREDIT,
    });

    let body = gpa_body(serde_json::json!({ "MA1101": "O", "PH1101": "B", "XX9999": "A" }));
    let (status, resp) = post_json(&app, "/api/results/gpa", &body, Some(&student_token())).await;
    assert_eq!(status, StatusCode::OK);
    // (10*4 + 6*3 + 8*3) / 10
    assert_eq!(resp["gpa"].as_f64().unwrap(), 8.2);
    assert_eq!(resp["countedSubjects"], 3);
    assert_eq!(resp["creditPolicy"], "default_credits");
}

#[tokio::test]
async fn blank_cells_are_ignored_and_no_grades_is_zero() {
    let app = test_app();

    let body = gpa_body(serde_json::json!({ "MA1101": "NONE", "PH1101": "" }));
    let (status, resp) = post_json(&app, "/api/results/gpa", &body, Some(&student_token())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["gpa"].as_f64().unwrap(), 0.0);
    assert_eq!(resp["countedSubjects"], 0);
}

#[tokio::test]
async fn invalid_grade_is_rejected() {
    let app = test_app();

    let body = gpa_body(serde_json::json!({ "MA1101": "E" }));
    let (status, resp) = post_json(&app, "/api/results/gpa", &body, Some(&student_token())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["kind"], "ValidationError");
    assert_eq!(resp["details"][0]["subject"], "MA1101");
}
