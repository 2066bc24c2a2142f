//! Semester GPA: credit-weighted mean of grade points.
//!
//! `GPA = Σ(credit × point) / Σ(credit)` over the graded subjects of one
//! semester. Which subjects count depends on the configured `CreditPolicy`.

use std::collections::{BTreeMap, HashMap};

use shared_types::{CreditPolicy, Grade, GradingConfig, SubjectCredit};

/// Credit value per subject code for one (department, semester).
pub type CreditMap = HashMap<String, u32>;

/// Round to two decimals, half away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Build a credit lookup from the subject catalog. NCC subjects and
/// non-positive credits are left out, so they read as "unknown".
pub fn credit_map(subjects: &[SubjectCredit]) -> CreditMap {
    subjects
        .iter()
        .filter(|s| !s.is_ncc && s.credit > 0)
        .map(|s| (s.subject_code.clone(), s.credit as u32))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpaOutcome {
    pub gpa: f64,
    pub counted_subjects: usize,
    pub total_credits: u64,
}

/// Compute a semester GPA and report how many subjects took part.
///
/// Ungraded cells never count. A subject with no known credit is skipped
/// under `Strict` and weighted with `default_credit` under `DefaultCredits`.
/// With nothing to count the GPA is 0.
pub fn semester_gpa(
    grades: &BTreeMap<String, Grade>,
    credits: &CreditMap,
    grading: &GradingConfig,
) -> GpaOutcome {
    let mut weighted: u64 = 0;
    let mut total_credits: u64 = 0;
    let mut counted = 0;

    for (subject, grade) in grades {
        if !grade.is_graded() {
            continue;
        }
        let credit = match (credits.get(subject), grading.credit_policy) {
            (Some(c), _) => *c,
            (None, CreditPolicy::DefaultCredits) => grading.default_credit,
            (None, CreditPolicy::Strict) => continue,
        };
        if credit == 0 {
            continue;
        }
        weighted += u64::from(credit) * u64::from(grade.point());
        total_credits += u64::from(credit);
        counted += 1;
    }

    let gpa = if total_credits == 0 {
        0.0
    } else {
        round2(weighted as f64 / total_credits as f64)
    };

    GpaOutcome {
        gpa,
        counted_subjects: counted,
        total_credits,
    }
}

/// Semester GPA rounded to two decimals.
pub fn calculate_gpa(
    grades: &BTreeMap<String, Grade>,
    credits: &CreditMap,
    grading: &GradingConfig,
) -> f64 {
    semester_gpa(grades, credits, grading).gpa
}
