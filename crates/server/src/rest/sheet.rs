use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use shared_types::{
    AppError, BulkUpdateRequest, BulkUpdateResponse, CohortQuery, CreateSheetRequest,
    SheetIdentity, SheetResponse, SheetSummary, UpdateGradeRequest, UpdateGradeResponse,
};

use super::extract::ApiJson;
use crate::auth::{AuthRequired, StaffRequired};
use crate::db::AppState;
use crate::grading::{cell, generate, merge};
use crate::repo::SheetRepository;

/// Path segments naming one sheet.
type SheetPath = Path<(String, String, i32, i32)>;

fn identity_from_path((batch, department, year, semester): (String, String, i32, i32)) -> SheetIdentity {
    SheetIdentity::new(batch, department, year, semester)
}

fn require_cohort(q: &CohortQuery) -> Result<(), AppError> {
    if q.batch.trim().is_empty() || q.department.trim().is_empty() {
        return Err(AppError::bad_request("batch and department are required"));
    }
    Ok(())
}

// ── Result sheet handlers ─────────────────────────────────────────

/// POST /api/result-sheets
#[utoipa::path(
    post,
    path = "/api/result-sheets",
    request_body = CreateSheetRequest,
    responses(
        (status = 201, description = "Result sheet generated", body = SheetResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 403, description = "Staff role required", body = AppError),
        (status = 409, description = "Sheet already exists", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "result-sheets"
)]
#[tracing::instrument(skip(state, _staff, body), fields(batch = %body.batch, department = %body.department))]
pub async fn create_sheet(
    State(state): State<AppState>,
    _staff: StaffRequired,
    ApiJson(body): ApiJson<CreateSheetRequest>,
) -> Result<(StatusCode, Json<SheetResponse>), AppError> {
    let sheet = generate::generate_sheet(
        state.sheets.as_ref(),
        state.rosters.as_ref(),
        state.subjects.as_ref(),
        &body,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(SheetResponse::from(sheet))))
}

/// GET /api/result-sheets?batch=&department=
#[utoipa::path(
    get,
    path = "/api/result-sheets",
    params(CohortQuery),
    responses(
        (status = 200, description = "Sheets of the cohort", body = Vec<SheetSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "result-sheets"
)]
#[tracing::instrument(skip(sheets, _auth))]
pub async fn list_sheets(
    State(sheets): State<Arc<dyn SheetRepository>>,
    _auth: AuthRequired,
    Query(q): Query<CohortQuery>,
) -> Result<Json<Vec<SheetSummary>>, AppError> {
    require_cohort(&q)?;
    let found = sheets.list_by_cohort(q.batch.trim(), q.department.trim()).await?;
    Ok(Json(found.iter().map(SheetSummary::from).collect()))
}

/// GET /api/result-sheets/{batch}/{department}/{year}/{semester}
#[utoipa::path(
    get,
    path = "/api/result-sheets/{batch}/{department}/{year}/{semester}",
    params(
        ("batch" = String, Path, description = "Batch, e.g. 2023-2027"),
        ("department" = String, Path, description = "Department code"),
        ("year" = i32, Path, description = "Year of study (1-4)"),
        ("semester" = i32, Path, description = "Semester (1-8)")
    ),
    responses(
        (status = 200, description = "Result sheet found", body = SheetResponse),
        (status = 404, description = "No sheet for this identity", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "result-sheets"
)]
#[tracing::instrument(skip(sheets, _auth))]
pub async fn get_sheet(
    State(sheets): State<Arc<dyn SheetRepository>>,
    _auth: AuthRequired,
    Path(path): SheetPath,
) -> Result<Json<SheetResponse>, AppError> {
    let identity = identity_from_path(path);
    let sheet = sheets
        .find_by_identity(&identity)
        .await?
        .ok_or_else(|| AppError::sheet_not_found(format!("Result sheet not found for {identity}")))?;
    Ok(Json(SheetResponse::from(sheet)))
}

/// PATCH /api/result-sheets/{batch}/{department}/{year}/{semester}/grade
#[utoipa::path(
    patch,
    path = "/api/result-sheets/{batch}/{department}/{year}/{semester}/grade",
    request_body = UpdateGradeRequest,
    params(
        ("batch" = String, Path, description = "Batch, e.g. 2023-2027"),
        ("department" = String, Path, description = "Department code"),
        ("year" = i32, Path, description = "Year of study (1-4)"),
        ("semester" = i32, Path, description = "Semester (1-8)")
    ),
    responses(
        (status = 200, description = "Grade updated", body = UpdateGradeResponse),
        (status = 400, description = "Invalid registration number, subject code or grade", body = AppError),
        (status = 404, description = "Sheet (code sheet_not_found) or student (code student_not_found) missing", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "result-sheets"
)]
#[tracing::instrument(skip(sheets, staff, body), fields(user = %staff.0.sub))]
pub async fn update_grade(
    State(sheets): State<Arc<dyn SheetRepository>>,
    staff: StaffRequired,
    Path(path): SheetPath,
    ApiJson(body): ApiJson<UpdateGradeRequest>,
) -> Result<Json<UpdateGradeResponse>, AppError> {
    let identity = identity_from_path(path);
    let resp = cell::update_cell(sheets.as_ref(), &identity, &body, Utc::now()).await?;
    tracing::info!(
        %identity,
        student = %resp.updated_fields.student,
        subject = %resp.updated_fields.subject,
        "grade updated"
    );
    Ok(Json(resp))
}

/// PATCH /api/result-sheets/{batch}/{department}/{year}/{semester}/bulk
#[utoipa::path(
    patch,
    path = "/api/result-sheets/{batch}/{department}/{year}/{semester}/bulk",
    request_body = BulkUpdateRequest,
    params(
        ("batch" = String, Path, description = "Batch, e.g. 2023-2027"),
        ("department" = String, Path, description = "Department code"),
        ("year" = i32, Path, description = "Year of study (1-4)"),
        ("semester" = i32, Path, description = "Semester (1-8)")
    ),
    responses(
        (status = 200, description = "Upload merged", body = BulkUpdateResponse),
        (status = 400, description = "Validation errors; nothing was written", body = AppError),
        (status = 404, description = "No sheet for this identity", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "result-sheets"
)]
#[tracing::instrument(skip(sheets, staff, body), fields(user = %staff.0.sub, rows = body.students.len()))]
pub async fn bulk_update(
    State(sheets): State<Arc<dyn SheetRepository>>,
    staff: StaffRequired,
    Path(path): SheetPath,
    ApiJson(body): ApiJson<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>, AppError> {
    let identity = identity_from_path(path);
    let resp = merge::merge_bulk_update(sheets.as_ref(), &identity, body, Utc::now()).await?;
    Ok(Json(resp))
}
