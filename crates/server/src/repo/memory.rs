//! In-process implementations of the storage ports.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{AppError, GradeSheet, RosterStudent, SheetIdentity, SubjectCredit};
use uuid::Uuid;

use super::{
    apply_roster_ops, RosterOp, RosterProvider, RosterWriteOutcome, SheetRepository,
    SubjectCatalog,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sheets keyed by identity. Every write holds the lock for its whole batch,
/// which gives the same all-or-nothing behaviour as the Postgres transaction.
#[derive(Default)]
pub struct InMemorySheetRepository {
    sheets: Mutex<HashMap<SheetIdentity, GradeSheet>>,
}

impl InMemorySheetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheets(sheets: impl IntoIterator<Item = GradeSheet>) -> Self {
        let repo = Self::new();
        {
            let mut map = lock(&repo.sheets);
            for s in sheets {
                map.insert(s.identity.clone(), s);
            }
        }
        repo
    }

    /// Copy of a stored sheet, for assertions.
    pub fn snapshot(&self, identity: &SheetIdentity) -> Option<GradeSheet> {
        lock(&self.sheets).get(identity).cloned()
    }
}

#[async_trait]
impl SheetRepository for InMemorySheetRepository {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_by_identity(
        &self,
        identity: &SheetIdentity,
    ) -> Result<Option<GradeSheet>, AppError> {
        Ok(self.snapshot(identity))
    }

    async fn list_by_cohort(
        &self,
        batch: &str,
        department: &str,
    ) -> Result<Vec<GradeSheet>, AppError> {
        let mut sheets: Vec<GradeSheet> = lock(&self.sheets)
            .values()
            .filter(|s| s.identity.batch == batch && s.identity.department == department)
            .cloned()
            .collect();
        sheets.sort_by_key(|s| (s.identity.year_number, s.identity.semester));
        Ok(sheets)
    }

    async fn insert(&self, sheet: &GradeSheet) -> Result<(), AppError> {
        let mut map = lock(&self.sheets);
        if map.contains_key(&sheet.identity) {
            return Err(AppError::conflict(format!(
                "Result sheet already exists for {}",
                sheet.identity
            )));
        }
        map.insert(sheet.identity.clone(), sheet.clone());
        Ok(())
    }

    async fn replace(&self, sheet: &GradeSheet) -> Result<(), AppError> {
        lock(&self.sheets).insert(sheet.identity.clone(), sheet.clone());
        Ok(())
    }

    async fn apply_roster_ops(
        &self,
        sheet_id: Uuid,
        ops: &[RosterOp],
        at: DateTime<Utc>,
    ) -> Result<RosterWriteOutcome, AppError> {
        let mut map = lock(&self.sheets);
        let sheet = map
            .values_mut()
            .find(|s| s.id == sheet_id)
            .ok_or_else(|| AppError::sheet_not_found(format!("Result sheet {sheet_id} not found")))?;

        let mut roster = sheet.roster.clone();
        let outcome = apply_roster_ops(&mut roster, ops);
        if outcome.modified > 0 {
            sheet.roster = roster;
            sheet.last_updated = at;
        }
        Ok(outcome)
    }
}

/// Fixed students and subjects for tests and local runs.
#[derive(Default)]
pub struct InMemoryReferenceData {
    students: Mutex<HashMap<(String, String), Vec<RosterStudent>>>,
    subjects: Mutex<HashMap<(String, i32), Vec<SubjectCredit>>>,
}

impl InMemoryReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_student(&self, batch: &str, department: &str, registration_number: &str, name: &str) {
        lock(&self.students)
            .entry((batch.to_string(), department.to_string()))
            .or_default()
            .push(RosterStudent {
                registration_number: registration_number.to_string(),
                name: name.to_string(),
            });
    }

    pub fn add_subject(&self, department: &str, semester: i32, subject: SubjectCredit) {
        lock(&self.subjects)
            .entry((department.to_string(), semester))
            .or_default()
            .push(subject);
    }
}

#[async_trait]
impl RosterProvider for InMemoryReferenceData {
    async fn students_in_cohort(
        &self,
        batch: &str,
        department: &str,
    ) -> Result<Vec<RosterStudent>, AppError> {
        let mut students = lock(&self.students)
            .get(&(batch.to_string(), department.to_string()))
            .cloned()
            .unwrap_or_default();
        students.sort_by(|a, b| a.registration_number.cmp(&b.registration_number));
        Ok(students)
    }
}

#[async_trait]
impl SubjectCatalog for InMemoryReferenceData {
    async fn subjects_for(
        &self,
        department: &str,
        semester: i32,
    ) -> Result<Vec<SubjectCredit>, AppError> {
        Ok(lock(&self.subjects)
            .get(&(department.to_string(), semester))
            .cloned()
            .unwrap_or_default())
    }
}
