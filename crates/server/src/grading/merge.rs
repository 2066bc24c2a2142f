//! Bulk merge of an uploaded grade sheet into a stored roster.
//!
//! The upload is validated as a whole first; any bad grade rejects the batch
//! with the complete list of offenders and nothing is written. A valid upload
//! becomes a list of `RosterOp`s that the repository applies atomically.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use shared_types::{
    is_valid_subject_code, AppError, BulkStudentEntry, BulkUpdateRequest, BulkUpdateResponse,
    Grade, GradeValidationIssue, RowStatus, SheetIdentity, StudentRecord,
    BULK_UPDATE_MAX_ENTRIES, EMPTY_GRADE_MARKER, LETTER_GRADES,
};

use crate::repo::{RosterOp, RosterWriteOutcome, SheetRepository};

pub const MSG_BULK_APPLIED: &str = "Bulk update completed successfully";
pub const MSG_NO_CHANGES: &str = "No changes to apply";

/// An upload row that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEntry {
    pub registration_number: String,
    pub name: String,
    pub grades: BTreeMap<String, Grade>,
}

/// Check every row and collect every problem.
///
/// Rows flagged `error` by the upload preview are skipped. Cells holding the
/// `NONE` marker or nothing at all are dropped before the subject and grade
/// checks.
pub fn validate_entries(
    entries: &[BulkStudentEntry],
) -> Result<Vec<ValidatedEntry>, Vec<GradeValidationIssue>> {
    let mut valid = Vec::with_capacity(entries.len());
    let mut issues = Vec::new();

    for entry in entries {
        if entry.row_status == RowStatus::Error {
            continue;
        }

        let registration_number = entry.registration_number.trim().to_string();
        if registration_number.is_empty() {
            issues.push(GradeValidationIssue {
                registration_number,
                subject: String::new(),
                grade: String::new(),
                message: "Registration number is required".to_string(),
            });
            continue;
        }

        let mut grades = BTreeMap::new();
        let mut row_ok = true;
        for (subject, raw) in &entry.grades {
            let subject = subject.trim();
            let raw = raw.trim();
            if raw.is_empty() || raw == EMPTY_GRADE_MARKER {
                continue;
            }
            if !is_valid_subject_code(subject) {
                row_ok = false;
                issues.push(GradeValidationIssue {
                    registration_number: registration_number.clone(),
                    subject: subject.to_string(),
                    grade: raw.to_string(),
                    message: format!("Invalid subject code: {subject:?}"),
                });
                continue;
            }
            match Grade::parse(raw) {
                Some(grade) => {
                    grades.insert(subject.to_string(), grade);
                }
                None => {
                    row_ok = false;
                    issues.push(GradeValidationIssue {
                        registration_number: registration_number.clone(),
                        subject: subject.to_string(),
                        grade: raw.to_string(),
                        message: format!(
                            "Invalid grade: {}. Valid values: {}",
                            raw,
                            LETTER_GRADES.join(", ")
                        ),
                    });
                }
            }
        }

        if row_ok {
            valid.push(ValidatedEntry {
                registration_number,
                name: entry.name.trim().to_string(),
                grades,
            });
        }
    }

    if issues.is_empty() {
        Ok(valid)
    } else {
        Err(issues)
    }
}

/// Turn validated rows into roster writes.
///
/// Students already on `roster` get a patch carrying every uploaded grade,
/// plus the name when a non-empty one was uploaded. Whether a cell actually
/// changes is decided by the repository under its write lock, so a grade
/// written by someone else after `roster` was read is still overwritten.
/// Unknown students are appended with exactly their uploaded grades; repeated
/// rows for the same student fold into one op.
pub fn plan_merge(roster: &[StudentRecord], entries: Vec<ValidatedEntry>) -> Vec<RosterOp> {
    let existing: HashSet<&str> = roster
        .iter()
        .map(|r| r.registration_number.as_str())
        .collect();

    let mut patches: Vec<(String, Option<String>, BTreeMap<String, Grade>)> = Vec::new();
    let mut patch_index: HashMap<String, usize> = HashMap::new();
    let mut appends: Vec<StudentRecord> = Vec::new();
    let mut append_index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        if existing.contains(entry.registration_number.as_str()) {
            let idx = *patch_index
                .entry(entry.registration_number.clone())
                .or_insert_with(|| {
                    patches.push((entry.registration_number.clone(), None, BTreeMap::new()));
                    patches.len() - 1
                });
            let (_, name, grades) = &mut patches[idx];
            if !entry.name.is_empty() {
                *name = Some(entry.name);
            }
            grades.extend(entry.grades);
        } else if let Some(&idx) = append_index.get(&entry.registration_number) {
            let pending = &mut appends[idx];
            if !entry.name.is_empty() {
                pending.name = entry.name;
            }
            pending.grades.extend(entry.grades);
        } else {
            append_index.insert(entry.registration_number.clone(), appends.len());
            appends.push(StudentRecord {
                registration_number: entry.registration_number,
                name: entry.name,
                grades: entry.grades,
            });
        }
    }

    patches
        .into_iter()
        .filter(|(_, name, grades)| name.is_some() || !grades.is_empty())
        .map(|(registration_number, name, grades)| RosterOp::PatchStudent {
            registration_number,
            name,
            grades,
        })
        .chain(appends.into_iter().map(RosterOp::AppendStudent))
        .collect()
}

/// Validate, plan and apply a bulk upload against the sheet for `identity`.
pub async fn merge_bulk_update(
    repo: &dyn SheetRepository,
    identity: &SheetIdentity,
    req: BulkUpdateRequest,
    now: DateTime<Utc>,
) -> Result<BulkUpdateResponse, AppError> {
    if req.students.len() > BULK_UPDATE_MAX_ENTRIES {
        let mut fields = HashMap::new();
        fields.insert(
            "students".to_string(),
            format!(
                "At most {} entries per upload, got {}",
                BULK_UPDATE_MAX_ENTRIES,
                req.students.len()
            ),
        );
        return Err(AppError::validation("Too many entries", fields));
    }

    let entries = validate_entries(&req.students).map_err(|issues| {
        tracing::info!(%identity, issues = issues.len(), "bulk update rejected");
        AppError::validation_details("Validation errors", &issues)
    })?;

    let sheet = repo.find_by_identity(identity).await?.ok_or_else(|| {
        AppError::sheet_not_found(format!("Result sheet not found for {identity}"))
    })?;

    let ops = plan_merge(&sheet.roster, entries);
    let outcome = if ops.is_empty() {
        RosterWriteOutcome::default()
    } else {
        repo.apply_roster_ops(sheet.id, &ops, now).await?
    };

    if outcome.modified == 0 {
        return Ok(BulkUpdateResponse {
            message: MSG_NO_CHANGES.to_string(),
            new_students: 0,
            updated_students: 0,
            total_operations: 0,
        });
    }

    let updated_students = outcome.modified - outcome.appended;
    tracing::info!(
        %identity,
        new_students = outcome.appended,
        updated_students,
        submitted = ops.len(),
        "bulk update applied"
    );

    Ok(BulkUpdateResponse {
        message: MSG_BULK_APPLIED.to_string(),
        new_students: outcome.appended,
        updated_students,
        total_operations: outcome.modified,
    })
}
