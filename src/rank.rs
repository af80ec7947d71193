use std::cmp::Ordering;

use crate::model::{ResultStatus, StudentResult};

/// Assign class positions for one cohort by competition ranking.
///
/// `No Data` records are kept out of the ranking pool but still count toward
/// `totalStudentsInClass`, so a "3rd of 40" figure reflects true class size.
/// Average score is the only comparison key: equal averages share the
/// identical position and the next distinct average resumes at
/// 1 + number of students ahead (1,2,2,4). No secondary sort key exists, so
/// position assignment is invariant under permutation of the input.
pub fn rank_class(results: Vec<StudentResult>) -> Vec<StudentResult> {
    let total_students = results.len();

    let mut pool: Vec<StudentResult> = Vec::with_capacity(results.len());
    let mut no_data: Vec<StudentResult> = Vec::new();
    for result in results {
        if result.status == ResultStatus::NoData {
            no_data.push(result);
        } else {
            pool.push(result);
        }
    }

    // Stable sort: tied students keep their incoming order, which is fine
    // because ties receive the identical position anyway.
    pool.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
    });

    let mut prev_average: Option<f64> = None;
    let mut current_position = 0usize;
    for (idx, result) in pool.iter_mut().enumerate() {
        if prev_average != result.average_score {
            current_position = idx + 1;
            prev_average = result.average_score;
        }
        result.position_in_class = Some(current_position);
        result.total_students_in_class = total_students;
    }

    for result in no_data.iter_mut() {
        result.position_in_class = None;
        result.total_students_in_class = total_students;
    }

    pool.extend(no_data);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassRoster;

    fn roster() -> ClassRoster {
        ClassRoster {
            class_id: "c1".to_string(),
            academic_year: "2025/2026".to_string(),
            term: "First Term".to_string(),
            student_ids: Vec::new(),
            assignments: Vec::new(),
        }
    }

    fn result(student_id: &str, average: Option<f64>) -> StudentResult {
        let mut r = StudentResult::no_data(student_id, &roster());
        if let Some(avg) = average {
            r.average_score = Some(avg);
            r.total_score = avg;
            r.graded_subjects = 1;
            r.total_subjects = 1;
            r.status = ResultStatus::Ranked;
        }
        r
    }

    fn positions(ranked: &[StudentResult]) -> Vec<(String, Option<usize>)> {
        ranked
            .iter()
            .map(|r| (r.student_id.clone(), r.position_in_class))
            .collect()
    }

    #[test]
    fn competition_ranking_skips_after_ties() {
        let ranked = rank_class(vec![
            result("s1", Some(90.0)),
            result("s2", Some(85.0)),
            result("s3", Some(85.0)),
            result("s4", Some(70.0)),
        ]);
        assert_eq!(
            positions(&ranked),
            vec![
                ("s1".to_string(), Some(1)),
                ("s2".to_string(), Some(2)),
                ("s3".to_string(), Some(2)),
                ("s4".to_string(), Some(4)),
            ]
        );
    }

    #[test]
    fn position_assignment_is_permutation_invariant() {
        let a = rank_class(vec![
            result("s1", Some(90.0)),
            result("s2", Some(85.0)),
            result("s3", Some(85.0)),
            result("s4", Some(70.0)),
        ]);
        let b = rank_class(vec![
            result("s4", Some(70.0)),
            result("s3", Some(85.0)),
            result("s1", Some(90.0)),
            result("s2", Some(85.0)),
        ]);

        let mut pos_a = positions(&a);
        let mut pos_b = positions(&b);
        pos_a.sort();
        pos_b.sort();
        assert_eq!(pos_a, pos_b);
    }

    #[test]
    fn no_data_students_counted_but_not_ranked() {
        let ranked = rank_class(vec![
            result("s1", Some(80.0)),
            result("s2", None),
            result("s3", Some(60.0)),
        ]);

        assert_eq!(ranked.len(), 3);
        for r in &ranked {
            assert_eq!(r.total_students_in_class, 3);
        }
        let s2 = ranked.iter().find(|r| r.student_id == "s2").expect("s2");
        assert_eq!(s2.position_in_class, None);
        assert_eq!(s2.status, ResultStatus::NoData);
        let s3 = ranked.iter().find(|r| r.student_id == "s3").expect("s3");
        assert_eq!(s3.position_in_class, Some(2));
    }

    #[test]
    fn all_tied_cohort_shares_first_place() {
        let ranked = rank_class(vec![
            result("s1", Some(75.0)),
            result("s2", Some(75.0)),
            result("s3", Some(75.0)),
        ]);
        for r in &ranked {
            assert_eq!(r.position_in_class, Some(1));
        }
    }

    #[test]
    fn empty_cohort_ranks_to_empty() {
        assert!(rank_class(Vec::new()).is_empty());
    }
}
