//! Result aggregation engine.
//!
//! `gpa`, `aggregate` and `cohort` are pure functions over sheets.
//! `merge`, `cell` and `generate` drive the storage ports in `crate::repo`.

pub mod aggregate;
pub mod cell;
pub mod cohort;
pub mod generate;
pub mod gpa;
pub mod merge;

use std::collections::BTreeSet;

use shared_types::{AppError, GradeSheet};

use crate::repo::SubjectCatalog;
use aggregate::SemesterCredits;
use gpa::credit_map;

/// Credit maps for every semester present in `sheets`.
pub async fn semester_credits(
    catalog: &dyn SubjectCatalog,
    department: &str,
    sheets: &[GradeSheet],
) -> Result<SemesterCredits, AppError> {
    let semesters: BTreeSet<i32> = sheets.iter().map(|s| s.identity.semester).collect();
    let mut credits = SemesterCredits::new();
    for semester in semesters {
        let subjects = catalog.subjects_for(department, semester).await?;
        credits.insert(semester, credit_map(&subjects));
    }
    Ok(credits)
}
