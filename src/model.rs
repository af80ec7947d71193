use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::grade::LetterGrade;

/// One recorded examination mark, immutable once a pass has read it.
/// Invariant: `0 <= score <= max_score`. Marks with a non-positive
/// `max_score` cannot produce a percentage and are skipped by aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentMark {
    pub assignment_id: String,
    pub student_id: String,
    pub test_type: String,
    pub score: f64,
    pub max_score: f64,
    /// Per-mark weight override inside its assessment type; 1.0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_date: Option<NaiveDate>,
}

impl AssessmentMark {
    /// Effective within-type weight; non-positive overrides fall back to 1.0.
    pub fn effective_weight(&self) -> f64 {
        match self.weight {
            Some(w) if w > 0.0 => w,
            _ => 1.0,
        }
    }
}

/// The teacher-subject-class-term-year tuple marks are recorded under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAssignment {
    pub id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub class_id: String,
    pub academic_year: String,
    pub term: String,
}

/// The cohort a reporting pass runs over: one class for one term/year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoster {
    pub class_id: String,
    pub academic_year: String,
    pub term: String,
    pub student_ids: Vec<String>,
    pub assignments: Vec<SubjectAssignment>,
}

/// Shared status vocabulary for subject rows and whole student records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Ranked,
    Incomplete,
    #[serde(rename = "No Data")]
    NoData,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Ranked => write!(f, "Ranked"),
            ResultStatus::Incomplete => write!(f, "Incomplete"),
            ResultStatus::NoData => write!(f, "No Data"),
        }
    }
}

/// One subject's contribution to a student's term result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject_id: String,
    pub teacher_id: String,
    pub assignment_id: String,
    /// Normalized 0-100 subject score; absent for `Incomplete` subjects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<LetterGrade>,
    pub status: ResultStatus,
    pub contributing_marks: usize,
}

/// A student's full term result. Derived, replaced atomically per pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    /// Stamped by the assembler; absent on pre-assembly records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    pub student_id: String,
    pub class_id: String,
    pub academic_year: String,
    pub term: String,
    pub subject_results: Vec<SubjectResult>,
    pub total_subjects: usize,
    pub graded_subjects: usize,
    pub total_score: f64,
    /// `total_score / graded_subjects`; absent when nothing was graded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    pub grade_distribution: BTreeMap<LetterGrade, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_in_class: Option<usize>,
    pub total_students_in_class: usize,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_issued: Option<NaiveDate>,
}

impl StudentResult {
    /// Placeholder record for a student whose aggregation failed or timed
    /// out. Keeps the ranking barrier deterministic: every roster student
    /// contributes exactly one entry.
    pub fn no_data(student_id: &str, roster: &ClassRoster) -> Self {
        StudentResult {
            result_id: None,
            student_id: student_id.to_string(),
            class_id: roster.class_id.clone(),
            academic_year: roster.academic_year.clone(),
            term: roster.term.clone(),
            subject_results: Vec::new(),
            total_subjects: 0,
            graded_subjects: 0,
            total_score: 0.0,
            average_score: None,
            grade_distribution: BTreeMap::new(),
            position_in_class: None,
            total_students_in_class: 0,
            status: ResultStatus::NoData,
            remarks: None,
            date_issued: None,
        }
    }
}
