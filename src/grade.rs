use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        write!(f, "{}", s)
    }
}

/// Default bands: closed-open intervals evaluated highest first, so a score
/// exactly on a boundary takes the higher grade. Operators retune these via
/// `GradeScale::new` without touching aggregation.
pub const DEFAULT_GRADE_BANDS: [(LetterGrade, f64); 5] = [
    (LetterGrade::A, 80.0),
    (LetterGrade::B, 70.0),
    (LetterGrade::C, 60.0),
    (LetterGrade::D, 50.0),
    (LetterGrade::F, 0.0),
];

/// Ordered threshold table mapping a normalized score to a letter grade.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    bands: Vec<(LetterGrade, f64)>,
}

impl Default for GradeScale {
    fn default() -> Self {
        GradeScale {
            bands: DEFAULT_GRADE_BANDS.to_vec(),
        }
    }
}

impl GradeScale {
    /// Build a custom scale. Bounds must be strictly descending, inside
    /// [0, 100], and the final band must start at 0 so the table is total
    /// over the whole score domain.
    pub fn new(bands: Vec<(LetterGrade, f64)>) -> Result<Self, EngineError> {
        if bands.is_empty() {
            return Err(EngineError::Invariant {
                reason: "grade scale must define at least one band".to_string(),
            });
        }
        let mut prev: Option<f64> = None;
        for (grade, bound) in &bands {
            if !bound.is_finite() || *bound < 0.0 || *bound > 100.0 {
                return Err(EngineError::Invariant {
                    reason: format!("band {} bound {} outside [0, 100]", grade, bound),
                });
            }
            if let Some(p) = prev {
                if *bound >= p {
                    return Err(EngineError::Invariant {
                        reason: format!("band bounds must be strictly descending at {}", grade),
                    });
                }
            }
            prev = Some(*bound);
        }
        if bands.last().map(|(_, b)| *b) != Some(0.0) {
            return Err(EngineError::Invariant {
                reason: "lowest band must start at 0 so every score classifies".to_string(),
            });
        }
        Ok(GradeScale { bands })
    }

    /// Total over [0, 100]; out-of-range input is clamped first.
    pub fn classify(&self, score: f64) -> LetterGrade {
        let score = score.clamp(0.0, 100.0);
        for (grade, lower) in &self.bands {
            if score >= *lower {
                return *grade;
            }
        }
        // Unreachable: the last band starts at 0.
        self.bands[self.bands.len() - 1].0
    }

    pub fn bands(&self) -> &[(LetterGrade, f64)] {
        &self.bands
    }
}
