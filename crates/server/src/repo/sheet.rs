use chrono::{DateTime, Utc};
use shared_types::{AppError, GradeSheet, SheetIdentity, StudentRecord};
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{apply_roster_ops, RosterOp, RosterWriteOutcome};
use crate::error_convert::SqlxErrorExt;

const SHEET_COLUMNS: &str = "id, batch, department, year_number, semester, exam_cycle, \
                             roster, created_at, last_updated";

#[derive(Debug, sqlx::FromRow)]
struct SheetRow {
    id: Uuid,
    batch: String,
    department: String,
    year_number: i32,
    semester: i32,
    exam_cycle: String,
    roster: Json<Vec<StudentRecord>>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl From<SheetRow> for GradeSheet {
    fn from(r: SheetRow) -> Self {
        GradeSheet {
            id: r.id,
            identity: SheetIdentity::new(r.batch, r.department, r.year_number, r.semester),
            exam_cycle: r.exam_cycle,
            roster: r.roster.0,
            created_at: r.created_at,
            last_updated: r.last_updated,
        }
    }
}

/// Find the sheet for an identity tuple.
pub async fn find_by_identity(
    pool: &Pool<Postgres>,
    identity: &SheetIdentity,
) -> Result<Option<GradeSheet>, AppError> {
    let sql = format!(
        "SELECT {SHEET_COLUMNS} FROM grade_sheets \
         WHERE batch = $1 AND department = $2 AND year_number = $3 AND semester = $4"
    );
    let row = sqlx::query_as::<_, SheetRow>(&sql)
        .bind(&identity.batch)
        .bind(&identity.department)
        .bind(identity.year_number)
        .bind(identity.semester)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(row.map(GradeSheet::from))
}

/// List every sheet of a cohort ordered by year and semester.
pub async fn list_by_cohort(
    pool: &Pool<Postgres>,
    batch: &str,
    department: &str,
) -> Result<Vec<GradeSheet>, AppError> {
    let sql = format!(
        "SELECT {SHEET_COLUMNS} FROM grade_sheets \
         WHERE batch = $1 AND department = $2 \
         ORDER BY year_number ASC, semester ASC"
    );
    let rows = sqlx::query_as::<_, SheetRow>(&sql)
        .bind(batch)
        .bind(department)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows.into_iter().map(GradeSheet::from).collect())
}

/// Insert a new sheet. The unique index on the identity tuple turns a
/// duplicate into `Conflict`.
pub async fn insert(pool: &Pool<Postgres>, sheet: &GradeSheet) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO grade_sheets
            (id, batch, department, year_number, semester, exam_cycle,
             roster, created_at, last_updated)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(sheet.id)
    .bind(&sheet.identity.batch)
    .bind(&sheet.identity.department)
    .bind(sheet.identity.year_number)
    .bind(sheet.identity.semester)
    .bind(&sheet.exam_cycle)
    .bind(Json(&sheet.roster))
    .bind(sheet.created_at)
    .bind(sheet.last_updated)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(())
}

/// Insert or wholesale-replace the sheet with the same identity.
pub async fn replace(pool: &Pool<Postgres>, sheet: &GradeSheet) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO grade_sheets
            (id, batch, department, year_number, semester, exam_cycle,
             roster, created_at, last_updated)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (batch, department, year_number, semester) DO UPDATE
        SET id = EXCLUDED.id,
            exam_cycle = EXCLUDED.exam_cycle,
            roster = EXCLUDED.roster,
            created_at = EXCLUDED.created_at,
            last_updated = EXCLUDED.last_updated
        "#,
    )
    .bind(sheet.id)
    .bind(&sheet.identity.batch)
    .bind(&sheet.identity.department)
    .bind(sheet.identity.year_number)
    .bind(sheet.identity.semester)
    .bind(&sheet.exam_cycle)
    .bind(Json(&sheet.roster))
    .bind(sheet.created_at)
    .bind(sheet.last_updated)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(())
}

/// Apply roster ops inside one transaction. The sheet row is locked with
/// `FOR UPDATE` so a batch is applied whole or not at all.
pub async fn apply_ops(
    pool: &Pool<Postgres>,
    sheet_id: Uuid,
    ops: &[RosterOp],
    at: DateTime<Utc>,
) -> Result<RosterWriteOutcome, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let roster: Option<Json<Vec<StudentRecord>>> =
        sqlx::query_scalar("SELECT roster FROM grade_sheets WHERE id = $1 FOR UPDATE")
            .bind(sheet_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

    let Some(Json(mut roster)) = roster else {
        return Err(AppError::sheet_not_found(format!(
            "Result sheet {sheet_id} not found"
        )));
    };

    let outcome = apply_roster_ops(&mut roster, ops);
    if outcome.modified > 0 {
        sqlx::query("UPDATE grade_sheets SET roster = $2, last_updated = $3 WHERE id = $1")
            .bind(sheet_id)
            .bind(Json(&roster))
            .bind(at)
            .execute(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
    }

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(outcome)
}
