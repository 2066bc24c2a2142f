use shared_types::{AppError, RosterStudent, SubjectCredit};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

/// Students of a cohort ordered by registration number.
pub async fn students_in_cohort(
    pool: &Pool<Postgres>,
    batch: &str,
    department: &str,
) -> Result<Vec<RosterStudent>, AppError> {
    let rows = sqlx::query_as::<_, RosterStudent>(
        r#"
        SELECT registration_number, name
        FROM students
        WHERE batch = $1 AND department = $2
        ORDER BY registration_number ASC
        "#,
    )
    .bind(batch)
    .bind(department)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}

/// Subjects of a department in a semester, NCC subjects included. Callers
/// decide whether to filter them.
pub async fn subjects_for(
    pool: &Pool<Postgres>,
    department: &str,
    semester: i32,
) -> Result<Vec<SubjectCredit>, AppError> {
    let rows = sqlx::query_as::<_, SubjectCredit>(
        r#"
        SELECT subject_code, credit, is_elective, is_ncc
        FROM subjects
        WHERE department = $1 AND semester = $2
        ORDER BY subject_code ASC
        "#,
    )
    .bind(department)
    .bind(semester)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(rows)
}
