//! Storage ports for result sheets and the reference data they are built from.
//!
//! The merge and update engines only talk to these traits. `pg` backs them
//! with Postgres, `memory` with in-process maps for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{
    AppError, Grade, GradeSheet, RosterStudent, SheetIdentity, StudentRecord, SubjectCredit,
};
use uuid::Uuid;

pub mod memory;
pub mod pg;
pub mod reference;
pub mod sheet;

pub use memory::{InMemoryReferenceData, InMemorySheetRepository};
pub use pg::{PgReferenceData, PgSheetRepository};

/// One write against a sheet roster.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterOp {
    /// Sparse patch of an existing student. Only the mentioned subjects are
    /// touched; `name` is set when present.
    PatchStudent {
        registration_number: String,
        name: Option<String>,
        grades: BTreeMap<String, Grade>,
    },
    /// Add a student that is not yet on the roster.
    AppendStudent(StudentRecord),
}

/// Counts reported by a roster write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterWriteOutcome {
    /// Ops whose target student was found (patches) or added (appends).
    pub matched: usize,
    /// Ops that changed at least one field.
    pub modified: usize,
    /// Students newly added to the roster. Included in `modified`.
    pub appended: usize,
}

/// Apply `ops` to a roster in order.
///
/// A patch for a student that is not on the roster is not matched and
/// changes nothing. An append for a student that already exists folds its
/// grades into the existing row so a replayed batch cannot duplicate rows.
pub fn apply_roster_ops(roster: &mut Vec<StudentRecord>, ops: &[RosterOp]) -> RosterWriteOutcome {
    let mut outcome = RosterWriteOutcome::default();

    for op in ops {
        match op {
            RosterOp::PatchStudent {
                registration_number,
                name,
                grades,
            } => {
                let Some(row) = roster
                    .iter_mut()
                    .find(|r| &r.registration_number == registration_number)
                else {
                    continue;
                };
                outcome.matched += 1;
                if patch_row(row, name.as_deref(), grades) {
                    outcome.modified += 1;
                }
            }
            RosterOp::AppendStudent(record) => {
                outcome.matched += 1;
                match roster
                    .iter_mut()
                    .find(|r| r.registration_number == record.registration_number)
                {
                    Some(row) => {
                        let name = (!record.name.is_empty()).then_some(record.name.as_str());
                        if patch_row(row, name, &record.grades) {
                            outcome.modified += 1;
                        }
                    }
                    None => {
                        roster.push(record.clone());
                        outcome.modified += 1;
                        outcome.appended += 1;
                    }
                }
            }
        }
    }

    outcome
}

fn patch_row(row: &mut StudentRecord, name: Option<&str>, grades: &BTreeMap<String, Grade>) -> bool {
    let mut changed = false;
    if let Some(name) = name {
        if row.name != name {
            row.name = name.to_string();
            changed = true;
        }
    }
    for (subject, grade) in grades {
        if row.grades.get(subject) != Some(grade) {
            row.grades.insert(subject.clone(), *grade);
            changed = true;
        }
    }
    changed
}

/// Persistence of result sheets.
#[async_trait]
pub trait SheetRepository: Send + Sync {
    /// Cheap connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;

    async fn find_by_identity(&self, identity: &SheetIdentity)
        -> Result<Option<GradeSheet>, AppError>;

    /// Every sheet of a (batch, department) cohort, in any order.
    async fn list_by_cohort(
        &self,
        batch: &str,
        department: &str,
    ) -> Result<Vec<GradeSheet>, AppError>;

    /// Store a new sheet. Fails with `Conflict` when the identity is taken.
    async fn insert(&self, sheet: &GradeSheet) -> Result<(), AppError>;

    /// Store a sheet, replacing any existing sheet with the same identity.
    async fn replace(&self, sheet: &GradeSheet) -> Result<(), AppError>;

    /// Apply a batch of roster ops as one atomic write and stamp
    /// `last_updated` with `at`. An unknown `sheet_id` is `sheet_not_found`.
    async fn apply_roster_ops(
        &self,
        sheet_id: Uuid,
        ops: &[RosterOp],
        at: DateTime<Utc>,
    ) -> Result<RosterWriteOutcome, AppError>;

    async fn patch_student_grades(
        &self,
        sheet_id: Uuid,
        registration_number: &str,
        patch: &BTreeMap<String, Grade>,
        at: DateTime<Utc>,
    ) -> Result<RosterWriteOutcome, AppError> {
        let op = RosterOp::PatchStudent {
            registration_number: registration_number.to_string(),
            name: None,
            grades: patch.clone(),
        };
        self.apply_roster_ops(sheet_id, std::slice::from_ref(&op), at)
            .await
    }

    async fn append_student(
        &self,
        sheet_id: Uuid,
        record: &StudentRecord,
        at: DateTime<Utc>,
    ) -> Result<RosterWriteOutcome, AppError> {
        let op = RosterOp::AppendStudent(record.clone());
        self.apply_roster_ops(sheet_id, std::slice::from_ref(&op), at)
            .await
    }
}

/// Students enrolled in a cohort.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn students_in_cohort(
        &self,
        batch: &str,
        department: &str,
    ) -> Result<Vec<RosterStudent>, AppError>;
}

/// Subjects and credits taught to a department in a semester.
#[async_trait]
pub trait SubjectCatalog: Send + Sync {
    async fn subjects_for(
        &self,
        department: &str,
        semester: i32,
    ) -> Result<Vec<SubjectCredit>, AppError>;
}
