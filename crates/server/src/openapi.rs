use axum::Router;
use shared_types::{
    AppError, AppErrorKind, BulkStudentEntry, BulkUpdateRequest, BulkUpdateResponse,
    CohortOverview, ComprehensiveAnalysis, CreateSheetRequest, GpaRequest, GpaResponse,
    GradeValidationIssue, OverallStatus, PerformanceDistribution, RowStatus, SemesterAnalysis,
    SemesterResult, SheetIdentity, SheetResponse, SheetSummary, StudentAggregate, StudentRecord,
    UpdateGradeRequest, UpdateGradeResponse, UpdatedFields,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::health;
use crate::rest;

/// Registers the bearer JWT scheme referenced by the handlers.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        // Result sheets
        rest::sheet::create_sheet,
        rest::sheet::list_sheets,
        rest::sheet::get_sheet,
        rest::sheet::update_grade,
        rest::sheet::bulk_update,
        // Results
        rest::analysis::get_analysis,
        rest::analysis::get_student_results,
        rest::analysis::calculate_gpa,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind,
        // Sheet schemas
        SheetIdentity, StudentRecord, SheetResponse, SheetSummary, CreateSheetRequest,
        UpdateGradeRequest, UpdateGradeResponse, UpdatedFields,
        BulkStudentEntry, BulkUpdateRequest, BulkUpdateResponse, RowStatus, GradeValidationIssue,
        // Analysis schemas
        SemesterResult, StudentAggregate, OverallStatus, PerformanceDistribution,
        CohortOverview, SemesterAnalysis, ComprehensiveAnalysis, GpaRequest, GpaResponse,
        health::HealthResponse,
        health::SheetStoreStatus,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "result-sheets", description = "Result sheet generation, lookup and grade entry"),
        (name = "results", description = "GPA, CGPA and cohort analysis"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "College Results API",
        description = "Result sheet management and GPA/CGPA aggregation",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build an Axum router that serves the API docs at `/docs`
/// and the REST API at `/api/*`.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(rest::api_router())
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
