use axum::extract::FromRef;
use shared_types::GradingConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use crate::repo::{
    PgReferenceData, PgSheetRepository, RosterProvider, SheetRepository, SubjectCatalog,
};

/// Shared application state passed to Axum handlers via `State`.
/// Derives `FromRef` so handlers can extract single fields directly.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub sheets: Arc<dyn SheetRepository>,
    pub rosters: Arc<dyn RosterProvider>,
    pub subjects: Arc<dyn SubjectCatalog>,
    pub grading: GradingConfig,
}

impl AppState {
    /// State backed by Postgres for every port.
    pub fn postgres(pool: Pool<Postgres>, grading: GradingConfig) -> Self {
        let reference = Arc::new(PgReferenceData::new(pool.clone()));
        Self {
            sheets: Arc::new(PgSheetRepository::new(pool)),
            rosters: reference.clone(),
            subjects: reference,
            grading,
        }
    }
}

/// Create a new database connection pool from environment variables.
/// Uses `connect_lazy` so no connections open until the first query.
pub fn create_pool() -> Result<Pool<Postgres>, sqlx::Error> {
    // Load .env file if present (ignored in production where env vars are set directly).
    let _ = dotenvy::dotenv();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| sqlx::Error::Configuration("DATABASE_URL must be set".into()))?;

    let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy(&database_url)
}

/// Run database migrations against the given pool.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
