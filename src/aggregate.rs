use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::formula::Formula;
use crate::grade::GradeScale;
use crate::model::{
    AssessmentMark, ClassRoster, ResultStatus, StudentResult, SubjectAssignment, SubjectResult,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectScore {
    pub score: f64,
    pub contributing_marks: usize,
}

#[derive(Debug, Default)]
struct TypeAccumulator {
    weighted_pct_sum: f64,
    weight_sum: f64,
    mark_count: usize,
}

impl TypeAccumulator {
    fn mean_pct(&self) -> f64 {
        if self.weight_sum > 0.0 {
            self.weighted_pct_sum / self.weight_sum
        } else {
            0.0
        }
    }
}

/// Combine one student's raw marks for a single assignment into a normalized
/// 0-100 subject score under `formula`.
///
/// Marks are grouped by assessment type; within a type the percentage is the
/// weight-weighted mean, so two quizzes average rather than sum and cannot
/// distort the type's share of the formula. The formula's weights are then
/// restricted to the types actually graded and renormalized to sum to 1.0:
/// a missing type redistributes its weight over the graded ones instead of
/// silently zeroing the score.
pub fn aggregate_subject_score(
    formula: &Formula,
    marks: &[AssessmentMark],
) -> Result<SubjectScore, EngineError> {
    // BTreeMap keeps type iteration (and so float accumulation order)
    // deterministic across passes.
    let mut by_type: BTreeMap<String, TypeAccumulator> = BTreeMap::new();

    for mark in marks {
        if mark.max_score <= 0.0 {
            // Cannot express a percentage; the mark does not make its type present.
            continue;
        }
        let pct = (100.0 * mark.score / mark.max_score).clamp(0.0, 100.0);
        let weight = mark.effective_weight();
        let acc = by_type
            .entry(mark.test_type.trim().to_ascii_lowercase())
            .or_default();
        acc.weighted_pct_sum += pct * weight;
        acc.weight_sum += weight;
        acc.mark_count += 1;
    }

    if by_type.is_empty() {
        return Err(EngineError::NoMarksAvailable);
    }

    let mut restricted_weight_sum = 0.0;
    for test_type in by_type.keys() {
        if let Some(w) = formula.weight_for(test_type) {
            restricted_weight_sum += w;
        }
    }
    if restricted_weight_sum <= 0.0 {
        // Marks exist, but none under a positively weighted type.
        return Err(EngineError::NoMarksAvailable);
    }

    let mut score = 0.0;
    let mut contributing_marks = 0;
    for (test_type, acc) in &by_type {
        let Some(weight) = formula.weight_for(test_type) else {
            continue;
        };
        if weight <= 0.0 {
            continue;
        }
        score += (weight / restricted_weight_sum) * acc.mean_pct();
        contributing_marks += acc.mark_count;
    }

    Ok(SubjectScore {
        score: score.clamp(0.0, 100.0),
        contributing_marks,
    })
}

/// Build one student's pre-ranking term result from their per-assignment
/// marks. `positionInClass` and `totalStudentsInClass` stay unset until the
/// ranking barrier.
///
/// Subjects with no usable marks appear in the breakdown as `Incomplete` and
/// are excluded from the total/average denominators. A student with zero
/// graded subjects is flagged `No Data` so the ranking engine can skip them
/// without inventing an average.
pub fn aggregate_student_result(
    student_id: &str,
    roster: &ClassRoster,
    marks_per_assignment: &[(SubjectAssignment, Vec<AssessmentMark>)],
    formula: &Formula,
    scale: &GradeScale,
) -> StudentResult {
    let mut subject_results: Vec<SubjectResult> = Vec::with_capacity(marks_per_assignment.len());
    let mut total_score = 0.0;
    let mut graded_subjects = 0usize;
    let mut grade_distribution: BTreeMap<_, usize> = BTreeMap::new();

    for (assignment, marks) in marks_per_assignment {
        let own_marks: Vec<AssessmentMark> = marks
            .iter()
            .filter(|m| m.student_id == student_id && m.assignment_id == assignment.id)
            .cloned()
            .collect();

        match aggregate_subject_score(formula, &own_marks) {
            Ok(subject) => {
                let grade = scale.classify(subject.score);
                total_score += subject.score;
                graded_subjects += 1;
                *grade_distribution.entry(grade).or_insert(0) += 1;
                subject_results.push(SubjectResult {
                    subject_id: assignment.subject_id.clone(),
                    teacher_id: assignment.teacher_id.clone(),
                    assignment_id: assignment.id.clone(),
                    score: Some(subject.score),
                    grade: Some(grade),
                    status: ResultStatus::Ranked,
                    contributing_marks: subject.contributing_marks,
                });
            }
            Err(EngineError::NoMarksAvailable) => {
                subject_results.push(SubjectResult {
                    subject_id: assignment.subject_id.clone(),
                    teacher_id: assignment.teacher_id.clone(),
                    assignment_id: assignment.id.clone(),
                    score: None,
                    grade: None,
                    status: ResultStatus::Incomplete,
                    contributing_marks: 0,
                });
            }
            // aggregate_subject_score has no other failure mode
            Err(_) => unreachable!("subject aggregation only fails with NoMarksAvailable"),
        }
    }

    let total_subjects = subject_results.len();
    let (average_score, status) = if graded_subjects == 0 {
        (None, ResultStatus::NoData)
    } else if graded_subjects < total_subjects {
        (Some(total_score / graded_subjects as f64), ResultStatus::Incomplete)
    } else {
        (Some(total_score / graded_subjects as f64), ResultStatus::Ranked)
    };

    StudentResult {
        result_id: None,
        student_id: student_id.to_string(),
        class_id: roster.class_id.clone(),
        academic_year: roster.academic_year.clone(),
        term: roster.term.clone(),
        subject_results,
        total_subjects,
        graded_subjects,
        total_score,
        average_score,
        grade_distribution,
        position_in_class: None,
        total_students_in_class: 0,
        status,
        remarks: None,
        date_issued: None,
    }
}
