pub mod analysis;
pub mod extract;
pub mod sheet;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::db::AppState;

/// Build the REST API router for result sheets and analysis.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Result sheets
        .route(
            "/api/result-sheets",
            get(sheet::list_sheets).post(sheet::create_sheet),
        )
        .route(
            "/api/result-sheets/{batch}/{department}/{year}/{semester}",
            get(sheet::get_sheet),
        )
        .route(
            "/api/result-sheets/{batch}/{department}/{year}/{semester}/grade",
            patch(sheet::update_grade),
        )
        .route(
            "/api/result-sheets/{batch}/{department}/{year}/{semester}/bulk",
            patch(sheet::bulk_update),
        )
        // Results and analysis
        .route("/api/results/analysis", get(analysis::get_analysis))
        .route(
            "/api/results/students/{registration_number}",
            get(analysis::get_student_results),
        )
        .route("/api/results/gpa", post(analysis::calculate_gpa))
}
