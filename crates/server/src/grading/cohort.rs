//! Cohort-wide statistics built on top of the student aggregates.

use shared_types::{
    CohortOverview, ComprehensiveAnalysis, GradeSheet, GradingConfig, OverallStatus,
    PerformanceDistribution, SemesterAnalysis, StudentAggregate,
};

use super::aggregate::{aggregate_students, needs_attention, top_performers, SemesterCredits};
use super::gpa::{round2, semester_gpa, CreditMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Excellent,
    VeryGood,
    Good,
    Average,
    BelowAverage,
}

/// Band boundaries are inclusive at the bottom: 9.0 is excellent, 8.999 is not.
pub fn performance_band(cgpa: f64) -> PerformanceBand {
    if cgpa >= 9.0 {
        PerformanceBand::Excellent
    } else if cgpa >= 8.0 {
        PerformanceBand::VeryGood
    } else if cgpa >= 7.0 {
        PerformanceBand::Good
    } else if cgpa >= 6.0 {
        PerformanceBand::Average
    } else {
        PerformanceBand::BelowAverage
    }
}

pub fn distribution(students: &[StudentAggregate]) -> PerformanceDistribution {
    let mut dist = PerformanceDistribution::default();
    for s in students {
        match performance_band(s.cgpa) {
            PerformanceBand::Excellent => dist.excellent += 1,
            PerformanceBand::VeryGood => dist.very_good += 1,
            PerformanceBand::Good => dist.good += 1,
            PerformanceBand::Average => dist.average += 1,
            PerformanceBand::BelowAverage => dist.below_average += 1,
        }
    }
    dist
}

pub fn overview(students: &[StudentAggregate], total_semesters: usize) -> CohortOverview {
    let passed = students
        .iter()
        .filter(|s| s.overall_status == OverallStatus::Passed)
        .count();
    let average_cgpa = if students.is_empty() {
        0.0
    } else {
        round2(students.iter().map(|s| s.cgpa).sum::<f64>() / students.len() as f64)
    };

    CohortOverview {
        total_students: students.len(),
        passed_students: passed,
        students_with_arrears: students.len() - passed,
        average_cgpa,
        total_semesters,
        performance_distribution: distribution(students),
    }
}

/// Whole-number pass percentage; an empty roster reports 0.
pub fn pass_percentage(passed: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (passed as f64 * 100.0 / total as f64).round() as i64
}

/// Per-sheet view: roster size, mean student GPA and share of students
/// without an arrear in that sheet.
pub fn semester_analysis(
    sheet: &GradeSheet,
    credits: &CreditMap,
    grading: &GradingConfig,
) -> SemesterAnalysis {
    let total = sheet.roster.len();
    let mut gpa_sum = 0.0;
    let mut passed = 0;
    for record in &sheet.roster {
        gpa_sum += semester_gpa(&record.grades, credits, grading).gpa;
        if !record.grades.values().any(|g| g.is_arrear()) {
            passed += 1;
        }
    }

    SemesterAnalysis {
        year: sheet.identity.year_number,
        semester: sheet.identity.semester,
        exam_cycle: sheet.exam_cycle.clone(),
        total_students: total,
        average_gpa: if total == 0 {
            0.0
        } else {
            round2(gpa_sum / total as f64)
        },
        pass_percentage: pass_percentage(passed, total),
    }
}

/// Full analysis of a cohort from all of its sheets.
pub fn comprehensive_analysis(
    sheets: &[GradeSheet],
    credits: &SemesterCredits,
    grading: &GradingConfig,
) -> ComprehensiveAnalysis {
    let students = aggregate_students(sheets, credits, grading);

    let mut ordered: Vec<&GradeSheet> = sheets.iter().collect();
    ordered.sort_by_key(|s| (s.identity.year_number, s.identity.semester));
    let no_credits = CreditMap::new();
    let semester_analysis = ordered
        .into_iter()
        .map(|sheet| {
            let sem_credits = credits.get(&sheet.identity.semester).unwrap_or(&no_credits);
            semester_analysis(sheet, sem_credits, grading)
        })
        .collect();

    ComprehensiveAnalysis {
        overview: overview(&students, sheets.len()),
        top_performers: top_performers(&students),
        needs_attention: needs_attention(&students),
        semester_analysis,
        students,
    }
}
