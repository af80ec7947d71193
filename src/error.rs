use thiserror::Error;

/// Errors raised by the result computation engine.
///
/// Configuration errors (`FormulaNotFound`, `NoActiveFormula`,
/// `InvalidFormula`) abort a reporting pass before any aggregation runs.
/// `NoMarksAvailable` and `AggregationTimeout` are absorbed by the pass
/// runner and only show up as `Incomplete` / `No Data` statuses in the
/// output records.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("formula not found: {id}")]
    FormulaNotFound { id: String },

    #[error("no formula is marked active")]
    NoActiveFormula,

    #[error("invalid formula {id}: {reason}")]
    InvalidFormula { id: String, reason: String },

    #[error("no marks available for this assignment")]
    NoMarksAvailable,

    #[error("aggregation timed out for student {student_id}")]
    AggregationTimeout { student_id: String },

    #[error("result invariant violated: {reason}")]
    Invariant { reason: String },
}

impl EngineError {
    pub fn invalid_formula(id: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidFormula {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that must stop a whole pass rather than downgrade a
    /// single subject or student.
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::FormulaNotFound { .. }
            | EngineError::NoActiveFormula
            | EngineError::InvalidFormula { .. }
            | EngineError::Invariant { .. } => true,
            EngineError::NoMarksAvailable | EngineError::AggregationTimeout { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_and_invariant_errors_are_fatal() {
        assert!(EngineError::NoActiveFormula.is_fatal());
        assert!(EngineError::FormulaNotFound { id: "x".to_string() }.is_fatal());
        assert!(EngineError::invalid_formula("x", "bad weight").is_fatal());
        assert!(!EngineError::NoMarksAvailable.is_fatal());
        assert!(!EngineError::AggregationTimeout {
            student_id: "s1".to_string()
        }
        .is_fatal());
    }
}
