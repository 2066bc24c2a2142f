use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use shared_types::{
    is_valid_registration_number, is_valid_subject_code, AppError, Grade, SheetIdentity,
    UpdateGradeRequest, UpdateGradeResponse, UpdatedFields, LETTER_GRADES,
};

use crate::repo::SheetRepository;

/// A single-cell update that passed the boundary checks.
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    pub registration_number: String,
    pub subject_code: String,
    pub grade: Grade,
}

/// Check registration number, subject code and grade together and report
/// every bad field at once.
pub fn validate_cell_update(req: &UpdateGradeRequest) -> Result<CellUpdate, AppError> {
    let mut fields = HashMap::new();

    let registration_number = req.registration_number.trim();
    if !is_valid_registration_number(registration_number) {
        fields.insert(
            "registrationNumber".to_string(),
            "Registration number must be exactly 12 digits".to_string(),
        );
    }

    let subject_code = req.subject_code.trim();
    if !is_valid_subject_code(subject_code) {
        fields.insert(
            "subjectCode".to_string(),
            "Subject code must be 2 uppercase letters followed by 4 digits".to_string(),
        );
    }

    let grade = Grade::parse(req.grade.trim()).filter(Grade::is_graded);
    if grade.is_none() {
        fields.insert(
            "grade".to_string(),
            format!(
                "Invalid grade: {}. Valid values: {}",
                req.grade,
                LETTER_GRADES.join(", ")
            ),
        );
    }

    match grade {
        Some(grade) if fields.is_empty() => Ok(CellUpdate {
            registration_number: registration_number.to_string(),
            subject_code: subject_code.to_string(),
            grade,
        }),
        _ => Err(AppError::validation("Validation failed", fields)),
    }
}

/// Set one grade cell on the sheet for `identity`.
///
/// A missing sheet and a missing student are both `NotFound` but carry
/// different codes.
pub async fn update_cell(
    repo: &dyn SheetRepository,
    identity: &SheetIdentity,
    req: &UpdateGradeRequest,
    now: DateTime<Utc>,
) -> Result<UpdateGradeResponse, AppError> {
    let update = validate_cell_update(req)?;

    let sheet = repo.find_by_identity(identity).await?.ok_or_else(|| {
        AppError::sheet_not_found(format!("Result sheet not found for {identity}"))
    })?;

    let student_missing = || {
        AppError::student_not_found(format!(
            "Student {} not found in result sheet",
            update.registration_number
        ))
    };
    if sheet.find_student(&update.registration_number).is_none() {
        return Err(student_missing());
    }

    let mut patch = BTreeMap::new();
    patch.insert(update.subject_code.clone(), update.grade);
    let outcome = repo
        .patch_student_grades(sheet.id, &update.registration_number, &patch, now)
        .await?;
    if outcome.matched == 0 {
        return Err(student_missing());
    }

    Ok(UpdateGradeResponse {
        success: true,
        updated_fields: UpdatedFields {
            student: update.registration_number,
            subject: update.subject_code,
            grade: update.grade.to_string(),
        },
    })
}
