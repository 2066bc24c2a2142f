use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::repo::SheetRepository;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Record the application start time. Call once during startup.
pub fn record_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Reachability of the result-sheet store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SheetStoreStatus {
    Connected,
    Unreachable,
}

/// Liveness of the results service.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `ok` when sheets can be read and written, `degraded` otherwise.
    pub status: String,
    /// Result-sheet store as seen by the grading endpoints.
    pub db: SheetStoreStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_error: Option<String>,
    pub uptime_seconds: u64,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up; `db` reports whether result sheets are reachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(sheets): State<Arc<dyn SheetRepository>>,
) -> Json<HealthResponse> {
    let (status, db, db_error) = match sheets.ping().await {
        Ok(()) => ("ok", SheetStoreStatus::Connected, None),
        Err(e) => {
            tracing::warn!(error = %e.message, "result sheet store unreachable");
            ("degraded", SheetStoreStatus::Unreachable, Some(e.message))
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        db,
        db_error,
        uptime_seconds: START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
