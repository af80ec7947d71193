//! Academic result computation engine: combines weighted assessment marks
//! into subject scores and letter grades, aggregates them into term results,
//! and ranks each class cohort with deterministic tie handling. Pure
//! computation; persistence and transport belong to the calling service.

pub mod aggregate;
pub mod assemble;
pub mod error;
pub mod formula;
pub mod grade;
pub mod model;
pub mod pass;
pub mod rank;
pub mod telemetry;

pub use aggregate::{aggregate_student_result, aggregate_subject_score, SubjectScore};
pub use assemble::assemble;
pub use error::EngineError;
pub use formula::{Formula, FormulaRef, FormulaRegistry};
pub use grade::{GradeScale, LetterGrade, DEFAULT_GRADE_BANDS};
pub use model::{
    AssessmentMark, ClassRoster, ResultStatus, StudentResult, SubjectAssignment, SubjectResult,
};
pub use pass::{run_pass, CohortSnapshot, MarkSource, PassConfig, SnapshotSource};
pub use rank::rank_class;
