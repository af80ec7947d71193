use std::collections::HashMap;

use resultcalc::{aggregate_subject_score, AssessmentMark, Formula, GradeScale, LetterGrade};

fn formula(weights: &[(&str, f64)]) -> Formula {
    Formula {
        id: "standard".to_string(),
        name: "Standard Weighting".to_string(),
        description: None,
        weights: weights.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        passing_score: 50.0,
        is_active: true,
    }
}

fn mark(test_type: &str, score: f64, max_score: f64) -> AssessmentMark {
    AssessmentMark {
        assignment_id: "a1".to_string(),
        student_id: "s1".to_string(),
        test_type: test_type.to_string(),
        score,
        max_score,
        weight: None,
        test_date: None,
    }
}

#[test]
fn scenario_a_both_types_graded() {
    let f = formula(&[("midterm", 0.3), ("endterm", 0.7)]);
    let marks = vec![mark("midterm", 60.0, 100.0), mark("endterm", 80.0, 100.0)];

    let subject = aggregate_subject_score(&f, &marks).expect("subject score");
    assert!((subject.score - 74.0).abs() < 1e-9);
    assert_eq!(GradeScale::default().classify(subject.score), LetterGrade::B);
}

#[test]
fn scenario_b_missing_type_renormalizes_instead_of_zeroing() {
    let f = formula(&[("midterm", 0.3), ("endterm", 0.7)]);
    let marks = vec![mark("endterm", 60.0, 100.0)];

    let subject = aggregate_subject_score(&f, &marks).expect("subject score");
    // endterm's 0.7 renormalizes to 1.0; the missing midterm does not drag
    // the score to 42.
    assert!((subject.score - 60.0).abs() < 1e-9);
    assert_eq!(GradeScale::default().classify(subject.score), LetterGrade::C);
}

#[test]
fn renormalized_weights_sum_to_one_for_any_present_subset() {
    let weight_tables: Vec<HashMap<String, f64>> = vec![
        HashMap::from([("quiz".to_string(), 2.0), ("endterm".to_string(), 5.0)]),
        HashMap::from([
            ("quiz".to_string(), 0.15),
            ("midterm".to_string(), 0.25),
            ("endterm".to_string(), 0.60),
        ]),
        HashMap::from([("endterm".to_string(), 42.0)]),
    ];

    for weights in weight_tables {
        let f = Formula {
            id: "f".to_string(),
            name: "f".to_string(),
            description: None,
            weights: weights.clone(),
            passing_score: 50.0,
            is_active: true,
        };
        // Grade a single type at 100%; under renormalization any solitary
        // present type must carry the full weight.
        for label in weights.keys() {
            let subject = aggregate_subject_score(&f, &[mark(label, 50.0, 50.0)])
                .expect("subject score");
            assert!(
                (subject.score - 100.0).abs() < 1e-9,
                "type {} did not renormalize to full weight",
                label
            );
        }
    }
}

#[test]
fn uneven_max_scores_normalize_to_percentages() {
    let f = formula(&[("quiz", 0.4), ("endterm", 0.6)]);
    // 18/20 = 90%, 45/60 = 75%
    let marks = vec![mark("quiz", 18.0, 20.0), mark("endterm", 45.0, 60.0)];

    let subject = aggregate_subject_score(&f, &marks).expect("subject score");
    let expected = 0.4 * 90.0 + 0.6 * 75.0;
    assert!((subject.score - expected).abs() < 1e-9);
}
