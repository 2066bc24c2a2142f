use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{AppError, GradeSheet, RosterStudent, SheetIdentity, SubjectCredit};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{reference, sheet, RosterOp, RosterProvider, RosterWriteOutcome, SheetRepository, SubjectCatalog};
use crate::error_convert::SqlxErrorExt;

/// `SheetRepository` over the `grade_sheets` table.
#[derive(Clone)]
pub struct PgSheetRepository {
    pool: Pool<Postgres>,
}

impl PgSheetRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SheetRepository for PgSheetRepository {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
        Ok(())
    }

    async fn find_by_identity(
        &self,
        identity: &SheetIdentity,
    ) -> Result<Option<GradeSheet>, AppError> {
        sheet::find_by_identity(&self.pool, identity).await
    }

    async fn list_by_cohort(
        &self,
        batch: &str,
        department: &str,
    ) -> Result<Vec<GradeSheet>, AppError> {
        sheet::list_by_cohort(&self.pool, batch, department).await
    }

    async fn insert(&self, s: &GradeSheet) -> Result<(), AppError> {
        sheet::insert(&self.pool, s).await
    }

    async fn replace(&self, s: &GradeSheet) -> Result<(), AppError> {
        sheet::replace(&self.pool, s).await
    }

    async fn apply_roster_ops(
        &self,
        sheet_id: Uuid,
        ops: &[RosterOp],
        at: DateTime<Utc>,
    ) -> Result<RosterWriteOutcome, AppError> {
        sheet::apply_ops(&self.pool, sheet_id, ops, at).await
    }
}

/// Roster and subject providers over the `students` and `subjects` tables.
#[derive(Clone)]
pub struct PgReferenceData {
    pool: Pool<Postgres>,
}

impl PgReferenceData {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterProvider for PgReferenceData {
    async fn students_in_cohort(
        &self,
        batch: &str,
        department: &str,
    ) -> Result<Vec<RosterStudent>, AppError> {
        reference::students_in_cohort(&self.pool, batch, department).await
    }
}

#[async_trait]
impl SubjectCatalog for PgReferenceData {
    async fn subjects_for(
        &self,
        department: &str,
        semester: i32,
    ) -> Result<Vec<SubjectCredit>, AppError> {
        reference::subjects_for(&self.pool, department, semester).await
    }
}
