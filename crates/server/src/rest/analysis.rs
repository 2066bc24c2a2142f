use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::collections::BTreeMap;

use shared_types::{
    AppError, CohortQuery, ComprehensiveAnalysis, GpaRequest, GpaResponse, Grade,
    GradeValidationIssue, StudentAggregate, EMPTY_GRADE_MARKER, LETTER_GRADES,
};

use super::extract::ApiJson;
use crate::auth::AuthRequired;
use crate::db::AppState;
use crate::grading::{self, aggregate, cohort, gpa};

// ── Analysis handlers ─────────────────────────────────────────────

/// GET /api/results/analysis?batch=&department=
#[utoipa::path(
    get,
    path = "/api/results/analysis",
    params(CohortQuery),
    responses(
        (status = 200, description = "Comprehensive cohort analysis", body = ComprehensiveAnalysis),
        (status = 400, description = "Missing batch or department", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "results"
)]
#[tracing::instrument(skip(state, _auth))]
pub async fn get_analysis(
    State(state): State<AppState>,
    _auth: AuthRequired,
    Query(q): Query<CohortQuery>,
) -> Result<Json<ComprehensiveAnalysis>, AppError> {
    let (batch, department) = (q.batch.trim(), q.department.trim());
    if batch.is_empty() || department.is_empty() {
        return Err(AppError::bad_request("batch and department are required"));
    }

    let sheets = state.sheets.list_by_cohort(batch, department).await?;
    let credits = grading::semester_credits(state.subjects.as_ref(), department, &sheets).await?;
    let analysis = cohort::comprehensive_analysis(&sheets, &credits, &state.grading);

    tracing::info!(
        sheets = sheets.len(),
        students = analysis.overview.total_students,
        "cohort analysis computed"
    );
    Ok(Json(analysis))
}

/// GET /api/results/students/{registration_number}?batch=&department=
#[utoipa::path(
    get,
    path = "/api/results/students/{registration_number}",
    params(
        ("registration_number" = String, Path, description = "12-digit registration number"),
        CohortQuery
    ),
    responses(
        (status = 200, description = "Student aggregate", body = StudentAggregate),
        (status = 404, description = "Student not on any sheet of the cohort", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "results"
)]
#[tracing::instrument(skip(state, _auth))]
pub async fn get_student_results(
    State(state): State<AppState>,
    _auth: AuthRequired,
    Path(registration_number): Path<String>,
    Query(q): Query<CohortQuery>,
) -> Result<Json<StudentAggregate>, AppError> {
    let (batch, department) = (q.batch.trim(), q.department.trim());
    if batch.is_empty() || department.is_empty() {
        return Err(AppError::bad_request("batch and department are required"));
    }

    let sheets = state.sheets.list_by_cohort(batch, department).await?;
    let credits = grading::semester_credits(state.subjects.as_ref(), department, &sheets).await?;
    aggregate::aggregate_students(&sheets, &credits, &state.grading)
        .into_iter()
        .find(|s| s.registration_number == registration_number)
        .map(Json)
        .ok_or_else(|| {
            AppError::student_not_found(format!(
                "Student {registration_number} has no results in {batch}/{department}"
            ))
        })
}

/// Parse a raw grade map, dropping blank and `NONE` cells.
fn parse_grade_map(raw: &BTreeMap<String, String>) -> Result<BTreeMap<String, Grade>, AppError> {
    let mut grades = BTreeMap::new();
    let mut issues = Vec::new();
    for (subject, value) in raw {
        let value = value.trim();
        if value.is_empty() || value == EMPTY_GRADE_MARKER {
            continue;
        }
        match Grade::parse(value) {
            Some(g) => {
                grades.insert(subject.clone(), g);
            }
            None => issues.push(GradeValidationIssue {
                registration_number: String::new(),
                subject: subject.clone(),
                grade: value.to_string(),
                message: format!(
                    "Invalid grade: {}. Valid values: {}",
                    value,
                    LETTER_GRADES.join(", ")
                ),
            }),
        }
    }
    if issues.is_empty() {
        Ok(grades)
    } else {
        Err(AppError::validation_details("Validation errors", &issues))
    }
}

/// POST /api/results/gpa
#[utoipa::path(
    post,
    path = "/api/results/gpa",
    request_body = GpaRequest,
    responses(
        (status = 200, description = "GPA for the supplied grades", body = GpaResponse),
        (status = 400, description = "Invalid grade in request", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "results"
)]
#[tracing::instrument(skip(state, _auth, body), fields(department = %body.department, semester = body.semester))]
pub async fn calculate_gpa(
    State(state): State<AppState>,
    _auth: AuthRequired,
    ApiJson(body): ApiJson<GpaRequest>,
) -> Result<Json<GpaResponse>, AppError> {
    let grades = parse_grade_map(&body.grades)?;
    let subjects = state
        .subjects
        .subjects_for(body.department.trim(), body.semester)
        .await?;
    let outcome = gpa::semester_gpa(&grades, &gpa::credit_map(&subjects), &state.grading);

    Ok(Json(GpaResponse {
        gpa: outcome.gpa,
        counted_subjects: outcome.counted_subjects,
        credit_policy: state.grading.credit_policy.as_str().to_string(),
    }))
}
