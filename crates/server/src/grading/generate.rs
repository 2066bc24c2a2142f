use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use shared_types::{
    AppError, CreateSheetRequest, Grade, GradeSheet, RosterStudent, SheetIdentity, StudentRecord,
    SubjectCredit,
};
use uuid::Uuid;

use crate::error_convert::ValidateRequest;
use crate::repo::{RosterProvider, SheetRepository, SubjectCatalog};

/// Build a fresh sheet: every student gets every non-NCC subject with an
/// empty grade. Repeated registration numbers and subject codes are kept once.
pub fn build_sheet(
    identity: SheetIdentity,
    exam_cycle: String,
    students: Vec<RosterStudent>,
    subjects: &[SubjectCredit],
    now: DateTime<Utc>,
) -> GradeSheet {
    let mut seen = HashSet::new();
    let codes: Vec<&str> = subjects
        .iter()
        .filter(|s| !s.is_ncc)
        .map(|s| s.subject_code.as_str())
        .filter(|c| seen.insert(*c))
        .collect();

    let mut enrolled = HashSet::new();
    let roster = students
        .into_iter()
        .filter(|s| enrolled.insert(s.registration_number.clone()))
        .map(|s| StudentRecord {
            registration_number: s.registration_number,
            name: s.name,
            grades: codes
                .iter()
                .map(|c| (c.to_string(), Grade::Ungraded))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect();

    GradeSheet {
        id: Uuid::new_v4(),
        identity,
        exam_cycle,
        roster,
        created_at: now,
        last_updated: now,
    }
}

/// Generate and store the sheet described by `req`.
///
/// An existing sheet with the same identity is a `Conflict` unless the
/// request asks to overwrite it.
pub async fn generate_sheet(
    sheets: &dyn SheetRepository,
    rosters: &dyn RosterProvider,
    catalog: &dyn SubjectCatalog,
    req: &CreateSheetRequest,
    now: DateTime<Utc>,
) -> Result<GradeSheet, AppError> {
    req.validate_request()?;
    let identity = req.identity();

    if !req.overwrite && sheets.find_by_identity(&identity).await?.is_some() {
        return Err(AppError::conflict(format!(
            "Result sheet already exists for {identity}"
        )));
    }

    let students = rosters
        .students_in_cohort(&identity.batch, &identity.department)
        .await?;
    let subjects = catalog
        .subjects_for(&identity.department, identity.semester)
        .await?;
    if students.is_empty() {
        tracing::warn!(%identity, "generating result sheet with an empty roster");
    }

    let sheet = build_sheet(identity, req.exam_cycle.trim().to_string(), students, &subjects, now);
    if req.overwrite {
        sheets.replace(&sheet).await?;
    } else {
        sheets.insert(&sheet).await?;
    }

    tracing::info!(
        identity = %sheet.identity,
        students = sheet.roster.len(),
        overwrite = req.overwrite,
        "result sheet generated"
    );
    Ok(sheet)
}
