use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::grade::Grade;

/// Pass/arrear standing of a student across all semesters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum OverallStatus {
    Passed,
    #[serde(rename = "Has Arrears")]
    HasArrears,
}

/// One semester inside a student aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SemesterResult {
    pub year: i32,
    pub semester: i32,
    pub gpa: f64,
    #[cfg_attr(feature = "openapi", schema(value_type = BTreeMap<String, String>))]
    pub grades: BTreeMap<String, Grade>,
    pub arrear_count: usize,
    pub subject_count: usize,
}

/// Everything known about one student across the sheets of a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudentAggregate {
    pub registration_number: String,
    pub name: String,
    pub semesters: Vec<SemesterResult>,
    pub total_arrears: usize,
    pub overall_status: OverallStatus,
    pub cgpa: f64,
    #[serde(rename = "averageGPA")]
    pub average_gpa: f64,
}

/// Student counts per CGPA band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDistribution {
    /// cgpa >= 9
    pub excellent: usize,
    /// 8 <= cgpa < 9
    pub very_good: usize,
    /// 7 <= cgpa < 8
    pub good: usize,
    /// 6 <= cgpa < 7
    pub average: usize,
    /// cgpa < 6
    pub below_average: usize,
}

/// Cohort-wide headline figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CohortOverview {
    pub total_students: usize,
    pub passed_students: usize,
    pub students_with_arrears: usize,
    #[serde(rename = "averageCGPA")]
    pub average_cgpa: f64,
    pub total_semesters: usize,
    pub performance_distribution: PerformanceDistribution,
}

/// Cohort view of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SemesterAnalysis {
    pub year: i32,
    pub semester: i32,
    pub exam_cycle: String,
    pub total_students: usize,
    #[serde(rename = "averageGPA")]
    pub average_gpa: f64,
    pub pass_percentage: i64,
}

/// Full analysis payload for a (batch, department) cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveAnalysis {
    pub overview: CohortOverview,
    pub students: Vec<StudentAggregate>,
    pub semester_analysis: Vec<SemesterAnalysis>,
    pub top_performers: Vec<StudentAggregate>,
    pub needs_attention: Vec<StudentAggregate>,
}

/// Request body for an ad-hoc GPA calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GpaRequest {
    pub department: String,
    pub semester: i32,
    /// Raw grade strings; checked against the enumeration by the handler.
    pub grades: BTreeMap<String, String>,
}

/// Response of an ad-hoc GPA calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GpaResponse {
    pub gpa: f64,
    /// Subjects that contributed to the result.
    pub counted_subjects: usize,
    pub credit_policy: String,
}
