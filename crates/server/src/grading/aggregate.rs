//! Folds the sheets of one (batch, department) into per-student aggregates.

use std::collections::{BTreeMap, HashMap};

use shared_types::{
    GradeSheet, GradingConfig, OverallStatus, SemesterResult, StudentAggregate, StudentRecord,
    DEFAULT_SUBJECT_CREDIT,
};

use super::gpa::{round2, semester_gpa, CreditMap};

/// Credit maps for a department keyed by semester number.
pub type SemesterCredits = HashMap<i32, CreditMap>;

/// How many students `top_performers` and `needs_attention` hold at most.
pub const SPOTLIGHT_LIMIT: usize = 10;

/// One student's row in one sheet, scored with the configured policy.
pub fn semester_result(
    sheet: &GradeSheet,
    record: &StudentRecord,
    credits: &CreditMap,
    grading: &GradingConfig,
) -> SemesterResult {
    let graded = record.grades.values().filter(|g| g.is_graded());
    let (subject_count, arrear_count) = graded.fold((0, 0), |(subjects, arrears), g| {
        (subjects + 1, arrears + usize::from(g.is_arrear()))
    });

    SemesterResult {
        year: sheet.identity.year_number,
        semester: sheet.identity.semester,
        gpa: semester_gpa(&record.grades, credits, grading).gpa,
        grades: record.grades.clone(),
        arrear_count,
        subject_count,
    }
}

/// Cumulative GPA over every graded cell, each weighted with the flat
/// default credit. Independent of the per-semester credit policy.
pub fn cumulative_gpa(semesters: &[SemesterResult]) -> f64 {
    let credit = u64::from(DEFAULT_SUBJECT_CREDIT);
    let (weighted, total) = semesters
        .iter()
        .flat_map(|s| s.grades.values())
        .filter(|g| g.is_graded())
        .fold((0u64, 0u64), |(w, t), g| {
            (w + credit * u64::from(g.point()), t + credit)
        });

    if total == 0 {
        0.0
    } else {
        round2(weighted as f64 / total as f64)
    }
}

fn average_gpa(semesters: &[SemesterResult]) -> f64 {
    if semesters.is_empty() {
        return 0.0;
    }
    let sum: f64 = semesters.iter().map(|s| s.gpa).sum();
    round2(sum / semesters.len() as f64)
}

/// Build one aggregate per distinct registration number across `sheets`.
///
/// Semesters inside an aggregate are ordered by (year, semester) and the name
/// is taken from the latest semester the student appears in. The result is
/// sorted by CGPA descending, ties broken by registration number.
pub fn aggregate_students(
    sheets: &[GradeSheet],
    credits: &SemesterCredits,
    grading: &GradingConfig,
) -> Vec<StudentAggregate> {
    let mut ordered: Vec<&GradeSheet> = sheets.iter().collect();
    ordered.sort_by_key(|s| (s.identity.year_number, s.identity.semester));

    let no_credits = CreditMap::new();
    let mut by_student: BTreeMap<&str, (String, Vec<SemesterResult>)> = BTreeMap::new();
    for sheet in ordered {
        let sem_credits = credits.get(&sheet.identity.semester).unwrap_or(&no_credits);
        for record in &sheet.roster {
            let entry = by_student
                .entry(record.registration_number.as_str())
                .or_insert_with(|| (String::new(), Vec::new()));
            if !record.name.is_empty() {
                entry.0 = record.name.clone();
            }
            entry
                .1
                .push(semester_result(sheet, record, sem_credits, grading));
        }
    }

    let mut students: Vec<StudentAggregate> = by_student
        .into_iter()
        .map(|(reg, (name, semesters))| {
            let total_arrears = semesters.iter().map(|s| s.arrear_count).sum();
            let overall_status = if total_arrears > 0 {
                OverallStatus::HasArrears
            } else {
                OverallStatus::Passed
            };
            StudentAggregate {
                registration_number: reg.to_string(),
                name,
                cgpa: cumulative_gpa(&semesters),
                average_gpa: average_gpa(&semesters),
                semesters,
                total_arrears,
                overall_status,
            }
        })
        .collect();

    sort_by_cgpa(&mut students);
    students
}

/// CGPA descending, then registration number ascending.
pub fn sort_by_cgpa(students: &mut [StudentAggregate]) {
    students.sort_by(|a, b| {
        b.cgpa
            .total_cmp(&a.cgpa)
            .then_with(|| a.registration_number.cmp(&b.registration_number))
    });
}

/// First `SPOTLIGHT_LIMIT` of an already sorted list.
pub fn top_performers(sorted: &[StudentAggregate]) -> Vec<StudentAggregate> {
    sorted.iter().take(SPOTLIGHT_LIMIT).cloned().collect()
}

/// First `SPOTLIGHT_LIMIT` students with arrears, keeping the sorted order.
pub fn needs_attention(sorted: &[StudentAggregate]) -> Vec<StudentAggregate> {
    sorted
        .iter()
        .filter(|s| s.overall_status == OverallStatus::HasArrears)
        .take(SPOTLIGHT_LIMIT)
        .cloned()
        .collect()
}
