use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    middleware, Router,
};
use serde_json::Value;
use server::auth::jwt::issue_token;
use server::auth::AuthConfig;
use server::db::AppState;
use server::rate_limit::{rate_limit_middleware, RateLimitState};
use server::repo::{InMemoryReferenceData, InMemorySheetRepository};
use shared_types::{GradingConfig, SheetIdentity, SubjectCredit};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "results-engine-test-secret";
pub const BATCH: &str = "2023-2027";
pub const DEPARTMENT: &str = "CSE";

pub const ASHA: &str = "212223104001";
pub const BALA: &str = "212223104002";
pub const CHITRA: &str = "212223104003";

/// A router over in-memory repositories plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub sheets: Arc<InMemorySheetRepository>,
    pub reference: Arc<InMemoryReferenceData>,
}

impl TestApp {
    pub fn snapshot(&self, year: i32, semester: i32) -> Option<shared_types::GradeSheet> {
        self.sheets
            .snapshot(&SheetIdentity::new(BATCH, DEPARTMENT, year, semester))
    }
}

fn subject(code: &str, credit: i32, is_ncc: bool) -> SubjectCredit {
    SubjectCredit {
        subject_code: code.to_string(),
        credit,
        is_elective: false,
        is_ncc,
    }
}

/// Three CSE students and a subject catalog for semesters 1 and 2.
fn seed_reference() -> Arc<InMemoryReferenceData> {
    let reference = Arc::new(InMemoryReferenceData::new());
    reference.add_student(BATCH, DEPARTMENT, BALA, "Bala");
    reference.add_student(BATCH, DEPARTMENT, ASHA, "Asha");
    reference.add_student(BATCH, DEPARTMENT, CHITRA, "Chitra");
    // Another cohort that must never leak into CSE sheets.
    reference.add_student(BATCH, "ECE", "212223106001", "Dev");

    reference.add_subject(DEPARTMENT, 1, subject("MA1101", 4, false));
    reference.add_subject(DEPARTMENT, 1, subject("PH1101", 3, false));
    reference.add_subject(DEPARTMENT, 1, subject("NC1101", 0, true));
    reference.add_subject(DEPARTMENT, 2, subject("CS1201", 4, false));
    reference.add_subject(DEPARTMENT, 2, subject("MA1201", 4, false));
    reference
}

fn build(grading: GradingConfig, rate_limit: Option<RateLimitState>) -> TestApp {
    let sheets = Arc::new(InMemorySheetRepository::new());
    let reference = seed_reference();
    let state = AppState {
        sheets: sheets.clone(),
        rosters: reference.clone(),
        subjects: reference.clone(),
        grading,
    };

    let mut router = server::openapi::api_router(state);
    if let Some(limits) = rate_limit {
        router = router.layer(middleware::from_fn_with_state(limits, rate_limit_middleware));
    }
    // Permissive auth middleware so the extractors see Claims when a token is sent.
    let router = router.layer(middleware::from_fn_with_state(
        AuthConfig::new(TEST_SECRET),
        server::auth::middleware::auth_middleware,
    ));

    TestApp {
        router,
        sheets,
        reference,
    }
}

/// Test app with the strict credit policy.
pub fn test_app() -> TestApp {
    build(GradingConfig::default(), None)
}

pub fn test_app_with_grading(grading: GradingConfig) -> TestApp {
    build(grading, None)
}

/// Test app allowing `max_requests` per client per minute.
pub fn test_app_rate_limited(max_requests: u32) -> TestApp {
    build(
        GradingConfig::default(),
        Some(RateLimitState::in_memory(max_requests, 60)),
    )
}

pub fn token_for(role: &str) -> String {
    issue_token(
        &AuthConfig::new(TEST_SECRET),
        "user-1",
        role,
        chrono::Duration::hours(1),
    )
    .expect("Failed to sign test token")
}

pub fn staff_token() -> String {
    token_for("staff")
}

pub fn student_token() -> String {
    token_for("student")
}

pub fn sheet_uri(year: i32, semester: i32) -> String {
    format!("/api/result-sheets/{BATCH}/{DEPARTMENT}/{year}/{semester}")
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// GET with an optional bearer token.
pub async fn get(app: &TestApp, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request("GET", uri, token, None)).await
}

/// POST JSON with an optional bearer token.
pub async fn post_json(
    app: &TestApp,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    send(app, request("POST", uri, token, Some(body))).await
}

/// PATCH JSON with an optional bearer token.
pub async fn patch_json(
    app: &TestApp,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    send(app, request("PATCH", uri, token, Some(body))).await
}

/// PATCH a raw body, for malformed JSON cases.
pub async fn patch_raw(app: &TestApp, uri: &str, body: &str, token: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

/// GET as a given client address, returning headers as well.
pub async fn get_from(
    app: &TestApp,
    uri: &str,
    client_ip: &str,
) -> (StatusCode, HeaderMap, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", client_ip)
        .body(Body::empty())
        .unwrap();
    send_raw(app, req).await
}

/// Generate the CSE sheet for a year and semester as staff.
pub async fn create_sheet(app: &TestApp, year: i32, semester: i32) -> Value {
    let body = serde_json::json!({
        "batch": BATCH,
        "department": DEPARTMENT,
        "yearNumber": year,
        "semester": semester,
        "examCycle": format!("NOV/DEC {}", 2023 + year),
    });
    let (status, resp) = post_json(app, "/api/result-sheets", &body, Some(&staff_token())).await;
    assert_eq!(status, StatusCode::CREATED, "sheet creation failed: {resp}");
    resp
}

/// Write grades through the bulk endpoint as staff.
pub async fn bulk_grades(
    app: &TestApp,
    year: i32,
    semester: i32,
    rows: &[(&str, Vec<(&str, &str)>)],
) -> (StatusCode, Value) {
    let students: Vec<Value> = rows
        .iter()
        .map(|(reg, grades)| {
            let grades: serde_json::Map<String, Value> = grades
                .iter()
                .map(|(s, g)| (s.to_string(), Value::String(g.to_string())))
                .collect();
            serde_json::json!({ "registrationNumber": reg, "grades": grades })
        })
        .collect();
    patch_json(
        app,
        &format!("{}/bulk", sheet_uri(year, semester)),
        &serde_json::json!({ "students": students }),
        Some(&staff_token()),
    )
    .await
}

async fn send_raw(app: &TestApp, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app
        .router
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, headers, body)
}

/// Send a request through the router and parse the response.
pub async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send_raw(app, req).await;
    (status, body)
}
