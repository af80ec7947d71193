use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineError;
use crate::formula::Formula;
use crate::model::{ResultStatus, StudentResult};

/// Freeze ranked records into their final reportable shape.
///
/// Performs no further computation: it validates the invariants downstream
/// consumers rely on, stamps the record id and issue date, and derives the
/// pass/fail remark from the formula's passing score. A validation failure
/// here is an engine bug, not bad input.
pub fn assemble(
    ranked: Vec<StudentResult>,
    formula: &Formula,
    issued_on: NaiveDate,
) -> Result<Vec<StudentResult>, EngineError> {
    let mut assembled = Vec::with_capacity(ranked.len());
    for mut result in ranked {
        validate_shape(&result)?;

        result.result_id = Some(Uuid::new_v4().to_string());
        result.date_issued = Some(issued_on);
        result.remarks = result.average_score.map(|avg| {
            if avg >= formula.passing_score {
                "Pass".to_string()
            } else {
                "Fail".to_string()
            }
        });
        assembled.push(result);
    }
    Ok(assembled)
}

fn validate_shape(result: &StudentResult) -> Result<(), EngineError> {
    let invariant = |reason: String| EngineError::Invariant {
        reason: format!("student {}: {}", result.student_id, reason),
    };

    if result.total_subjects != result.subject_results.len() {
        return Err(invariant(format!(
            "totalSubjects {} does not match {} subject rows",
            result.total_subjects,
            result.subject_results.len()
        )));
    }
    let graded_rows = result
        .subject_results
        .iter()
        .filter(|s| s.status == ResultStatus::Ranked)
        .count();
    if graded_rows != result.graded_subjects {
        return Err(invariant(format!(
            "gradedSubjects {} does not match {} graded rows",
            result.graded_subjects, graded_rows
        )));
    }
    if result.total_score < 0.0 {
        return Err(invariant(format!("negative total score {}", result.total_score)));
    }

    match result.status {
        ResultStatus::NoData => {
            if result.position_in_class.is_some() {
                return Err(invariant("No Data record carries a class position".to_string()));
            }
            if result.average_score.is_some() {
                return Err(invariant("No Data record carries an average".to_string()));
            }
        }
        ResultStatus::Ranked | ResultStatus::Incomplete => {
            if result.subject_results.is_empty() {
                return Err(invariant("ranked record has no subject rows".to_string()));
            }
            if result.average_score.is_none() {
                return Err(invariant("ranked record is missing its average".to_string()));
            }
            let Some(position) = result.position_in_class else {
                return Err(invariant("ranked record is missing its class position".to_string()));
            };
            if position == 0 || position > result.total_students_in_class {
                return Err(invariant(format!(
                    "position {} outside 1..={}",
                    position, result.total_students_in_class
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_student_result;
    use crate::grade::GradeScale;
    use crate::model::{AssessmentMark, ClassRoster, SubjectAssignment};
    use crate::rank::rank_class;
    use std::collections::HashMap;

    fn formula(passing_score: f64) -> Formula {
        Formula {
            id: "f1".to_string(),
            name: "Standard".to_string(),
            description: None,
            weights: HashMap::from([("endterm".to_string(), 1.0)]),
            passing_score,
            is_active: true,
        }
    }

    fn roster() -> ClassRoster {
        ClassRoster {
            class_id: "c1".to_string(),
            academic_year: "2025/2026".to_string(),
            term: "First Term".to_string(),
            student_ids: vec!["s1".to_string()],
            assignments: vec![SubjectAssignment {
                id: "a1".to_string(),
                teacher_id: "t1".to_string(),
                subject_id: "math".to_string(),
                class_id: "c1".to_string(),
                academic_year: "2025/2026".to_string(),
                term: "First Term".to_string(),
            }],
        }
    }

    fn ranked_single(score: f64) -> Vec<StudentResult> {
        let r = roster();
        let mark = AssessmentMark {
            assignment_id: "a1".to_string(),
            student_id: "s1".to_string(),
            test_type: "endterm".to_string(),
            score,
            max_score: 100.0,
            weight: None,
            test_date: None,
        };
        let per_assignment = vec![(r.assignments[0].clone(), vec![mark])];
        let result =
            aggregate_student_result("s1", &r, &per_assignment, &formula(50.0), &GradeScale::default());
        rank_class(vec![result])
    }

    fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 24).expect("date")
    }

    #[test]
    fn stamps_id_date_and_pass_remark() {
        let assembled =
            assemble(ranked_single(72.0), &formula(50.0), issue_date()).expect("assemble");
        let r = &assembled[0];
        assert!(r.result_id.is_some());
        assert_eq!(r.date_issued, Some(issue_date()));
        assert_eq!(r.remarks.as_deref(), Some("Pass"));
    }

    #[test]
    fn below_passing_score_remarks_fail() {
        let assembled =
            assemble(ranked_single(42.0), &formula(50.0), issue_date()).expect("assemble");
        assert_eq!(assembled[0].remarks.as_deref(), Some("Fail"));
    }

    #[test]
    fn no_data_record_passes_with_no_remark() {
        let ranked = rank_class(vec![StudentResult::no_data("s1", &roster())]);
        let assembled = assemble(ranked, &formula(50.0), issue_date()).expect("assemble");
        assert_eq!(assembled[0].remarks, None);
        assert_eq!(assembled[0].position_in_class, None);
    }

    #[test]
    fn rejects_position_beyond_class_size() {
        let mut ranked = ranked_single(72.0);
        ranked[0].position_in_class = Some(5);
        let err = assemble(ranked, &formula(50.0), issue_date());
        assert!(matches!(err, Err(EngineError::Invariant { .. })));
    }

    #[test]
    fn rejects_unranked_record_outside_no_data() {
        let mut ranked = ranked_single(72.0);
        ranked[0].position_in_class = None;
        let err = assemble(ranked, &formula(50.0), issue_date());
        assert!(matches!(err, Err(EngineError::Invariant { .. })));
    }

    #[test]
    fn rejects_mismatched_subject_counts() {
        let mut ranked = ranked_single(72.0);
        ranked[0].total_subjects = 3;
        let err = assemble(ranked, &formula(50.0), issue_date());
        assert!(matches!(err, Err(EngineError::Invariant { .. })));
    }
}
