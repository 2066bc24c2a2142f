use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::grade::Grade;

// ── Validation constants ────────────────────────────────────────────

/// Upper bound on entries accepted by one bulk grade upload.
pub const BULK_UPDATE_MAX_ENTRIES: usize = 5000;

/// Registration numbers are exactly 12 ASCII digits.
pub fn is_valid_registration_number(s: &str) -> bool {
    s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Subject codes are two uppercase letters followed by four digits (e.g. `CS3401`).
pub fn is_valid_subject_code(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 6
        && b[..2].iter().all(|c| c.is_ascii_uppercase())
        && b[2..].iter().all(|c| c.is_ascii_digit())
}

/// Roman label shown for a year of study; falls back to the number itself.
pub fn year_label(year_number: i32) -> String {
    match year_number {
        1 => "I".to_string(),
        2 => "II".to_string(),
        3 => "III".to_string(),
        4 => "IV".to_string(),
        n => n.to_string(),
    }
}

// ── Domain structs ──────────────────────────────────────────────────

/// Identity tuple of a result sheet. At most one sheet exists per tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SheetIdentity {
    pub batch: String,
    pub department: String,
    pub year_number: i32,
    pub semester: i32,
}

impl SheetIdentity {
    pub fn new(
        batch: impl Into<String>,
        department: impl Into<String>,
        year_number: i32,
        semester: i32,
    ) -> Self {
        Self {
            batch: batch.into(),
            department: department.into(),
            year_number,
            semester,
        }
    }
}

impl std::fmt::Display for SheetIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/year {}/semester {}",
            self.batch, self.department, self.year_number, self.semester
        )
    }
}

/// One student's row inside a sheet roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub registration_number: String,
    pub name: String,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = BTreeMap<String, String>))]
    pub grades: BTreeMap<String, Grade>,
}

/// A stored result sheet: identity, exam cycle and the embedded roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSheet {
    pub id: Uuid,
    #[serde(flatten)]
    pub identity: SheetIdentity,
    pub exam_cycle: String,
    pub roster: Vec<StudentRecord>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl GradeSheet {
    pub fn find_student(&self, registration_number: &str) -> Option<&StudentRecord> {
        self.roster
            .iter()
            .find(|s| s.registration_number == registration_number)
    }
}

/// A student as listed by the roster provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RosterStudent {
    pub registration_number: String,
    pub name: String,
}

/// A subject as listed by the subject/credit provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SubjectCredit {
    pub subject_code: String,
    pub credit: i32,
    pub is_elective: bool,
    pub is_ncc: bool,
}

// ── API response types ──────────────────────────────────────────────

/// API response shape for a result sheet. The roster is sorted by
/// registration number ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SheetResponse {
    pub sheet_id: String,
    pub department: String,
    /// Roman label of the year of study.
    pub year: String,
    pub semester: i32,
    pub batch: String,
    pub exam_cycle: String,
    pub roster: Vec<StudentRecord>,
    pub last_updated: String,
}

impl From<GradeSheet> for SheetResponse {
    fn from(s: GradeSheet) -> Self {
        let mut roster = s.roster;
        roster.sort_by(|a, b| a.registration_number.cmp(&b.registration_number));
        Self {
            sheet_id: s.id.to_string(),
            department: s.identity.department,
            year: year_label(s.identity.year_number),
            semester: s.identity.semester,
            batch: s.identity.batch,
            exam_cycle: s.exam_cycle,
            roster,
            last_updated: s.last_updated.to_rfc3339(),
        }
    }
}

/// Compact listing row for the sheets of a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub sheet_id: String,
    pub batch: String,
    pub department: String,
    pub year_number: i32,
    pub year: String,
    pub semester: i32,
    pub exam_cycle: String,
    pub student_count: usize,
    pub last_updated: String,
}

impl From<&GradeSheet> for SheetSummary {
    fn from(s: &GradeSheet) -> Self {
        Self {
            sheet_id: s.id.to_string(),
            batch: s.identity.batch.clone(),
            department: s.identity.department.clone(),
            year_number: s.identity.year_number,
            year: year_label(s.identity.year_number),
            semester: s.identity.semester,
            exam_cycle: s.exam_cycle.clone(),
            student_count: s.roster.len(),
            last_updated: s.last_updated.to_rfc3339(),
        }
    }
}

// ── Request DTOs ────────────────────────────────────────────────────

/// Request body for generating a new sheet from the reference rosters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
#[serde(rename_all = "camelCase")]
pub struct CreateSheetRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Batch is required"))
    )]
    pub batch: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Department is required"))
    )]
    pub department: String,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 1, max = 4, message = "Year must be between 1 and 4"))
    )]
    pub year_number: i32,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 1, max = 8, message = "Semester must be between 1 and 8"))
    )]
    pub semester: i32,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Exam cycle is required"))
    )]
    pub exam_cycle: String,
    /// Replace an existing sheet with the same identity instead of failing.
    #[serde(default)]
    pub overwrite: bool,
}

impl CreateSheetRequest {
    pub fn identity(&self) -> SheetIdentity {
        SheetIdentity::new(
            self.batch.trim(),
            self.department.trim(),
            self.year_number,
            self.semester,
        )
    }
}

/// Query parameters selecting the sheets of one cohort.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct CohortQuery {
    pub batch: String,
    pub department: String,
}

/// Request body for a single-cell grade update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateGradeRequest {
    pub registration_number: String,
    pub subject_code: String,
    pub grade: String,
}

/// Fields written by a single-cell update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdatedFields {
    pub student: String,
    pub subject: String,
    pub grade: String,
}

/// Response for a single-cell grade update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateGradeResponse {
    pub success: bool,
    pub updated_fields: UpdatedFields,
}

/// Per-row status assigned by the upload preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    #[default]
    Valid,
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

/// One uploaded row of a bulk grade update. Grades are raw strings and are
/// checked against the letter-grade enumeration before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BulkStudentEntry {
    pub registration_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub grades: BTreeMap<String, String>,
    #[serde(default)]
    pub row_status: RowStatus,
}

/// Request body for a bulk grade update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkUpdateRequest {
    pub students: Vec<BulkStudentEntry>,
}

/// Result of a bulk grade update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResponse {
    pub message: String,
    pub new_students: usize,
    pub updated_students: usize,
    pub total_operations: usize,
}

/// One offending cell reported by bulk validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GradeValidationIssue {
    pub registration_number: String,
    pub subject: String,
    pub grade: String,
    pub message: String,
}
