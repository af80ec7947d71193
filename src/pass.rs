use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::aggregate::aggregate_student_result;
use crate::assemble::assemble;
use crate::error::EngineError;
use crate::formula::{Formula, FormulaRef, FormulaRegistry};
use crate::grade::GradeScale;
use crate::model::{AssessmentMark, ClassRoster, StudentResult, SubjectAssignment};
use crate::rank::rank_class;

/// The mark-storage collaborator. A pass only ever reads from it.
#[async_trait]
pub trait MarkSource: Send + Sync {
    async fn marks_for_student(
        &self,
        student_id: &str,
        assignment: &SubjectAssignment,
    ) -> anyhow::Result<Vec<AssessmentMark>>;
}

/// Everything a reporting pass consumes, as one deserializable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSnapshot {
    pub formulas: Vec<Formula>,
    pub roster: ClassRoster,
    pub marks: Vec<AssessmentMark>,
}

/// In-memory `MarkSource` over a snapshot, indexed by assignment + student.
pub struct SnapshotSource {
    by_key: HashMap<(String, String), Vec<AssessmentMark>>,
}

impl SnapshotSource {
    pub fn new(marks: Vec<AssessmentMark>) -> Self {
        let mut by_key: HashMap<(String, String), Vec<AssessmentMark>> = HashMap::new();
        for mark in marks {
            by_key
                .entry((mark.assignment_id.clone(), mark.student_id.clone()))
                .or_default()
                .push(mark);
        }
        SnapshotSource { by_key }
    }
}

#[async_trait]
impl MarkSource for SnapshotSource {
    async fn marks_for_student(
        &self,
        student_id: &str,
        assignment: &SubjectAssignment,
    ) -> anyhow::Result<Vec<AssessmentMark>> {
        Ok(self
            .by_key
            .get(&(assignment.id.clone(), student_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct PassConfig {
    /// Upper bound on students aggregating at once, so a pass cannot
    /// overwhelm the mark-storage collaborator.
    pub concurrency: usize,
    /// Budget for one student's fetch + aggregation. A student over budget
    /// is downgraded to `No Data` for this pass and retried on the next one.
    pub student_timeout: Duration,
}

impl Default for PassConfig {
    fn default() -> Self {
        PassConfig {
            concurrency: 8,
            student_timeout: Duration::from_secs(30),
        }
    }
}

/// Run one full reporting pass for a cohort: resolve the formula once,
/// aggregate every roster student concurrently, rank at the barrier, then
/// assemble the final records.
///
/// The formula is resolved before any aggregation and held fixed for the
/// whole pass, so every student in one ranking is compared under identical
/// weights. Configuration errors abort the pass; per-student failures are
/// absorbed as explicit `No Data` records so the ranking barrier always
/// receives one entry per roster student.
pub async fn run_pass(
    registry: &FormulaRegistry,
    wanted: &FormulaRef,
    scale: &GradeScale,
    roster: &ClassRoster,
    source: Arc<dyn MarkSource>,
    config: &PassConfig,
    issued_on: NaiveDate,
) -> Result<Vec<StudentResult>, EngineError> {
    let formula = Arc::new(registry.resolve(wanted)?.clone());
    let scale = Arc::new(scale.clone());
    let roster = Arc::new(roster.clone());

    info!(
        class_id = %roster.class_id,
        term = %roster.term,
        academic_year = %roster.academic_year,
        students = roster.student_ids.len(),
        subjects = roster.assignments.len(),
        formula = %formula.id,
        "starting reporting pass"
    );

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks: JoinSet<(usize, StudentResult)> = JoinSet::new();

    for (idx, student_id) in roster.student_ids.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let source = Arc::clone(&source);
        let formula = Arc::clone(&formula);
        let scale = Arc::clone(&scale);
        let roster = Arc::clone(&roster);
        let timeout = config.student_timeout;

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!(student_id = %student_id, "worker pool closed before aggregation");
                    return (idx, StudentResult::no_data(&student_id, &roster));
                }
            };

            let attempt = tokio::time::timeout(
                timeout,
                aggregate_one(&student_id, &roster, source.as_ref(), &formula, &scale),
            )
            .await;

            let result = match attempt {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => {
                    warn!(
                        student_id = %student_id,
                        error = %err,
                        "aggregation failed; recording No Data for this pass"
                    );
                    StudentResult::no_data(&student_id, &roster)
                }
                Err(_) => {
                    let err = EngineError::AggregationTimeout {
                        student_id: student_id.clone(),
                    };
                    warn!(error = %err, "recording No Data for this pass");
                    StudentResult::no_data(&student_id, &roster)
                }
            };
            (idx, result)
        });
    }

    // Barrier: ranking needs one finished-or-downgraded entry per student.
    let mut slots: Vec<Option<StudentResult>> = vec![None; roster.student_ids.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, result)) => slots[idx] = Some(result),
            Err(err) => warn!(error = %err, "aggregation task aborted"),
        }
    }
    let results: Vec<StudentResult> = slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.unwrap_or_else(|| StudentResult::no_data(&roster.student_ids[idx], &roster))
        })
        .collect();

    let ranked = rank_class(results);
    let assembled = assemble(ranked, &formula, issued_on)?;

    let no_data = assembled
        .iter()
        .filter(|r| r.position_in_class.is_none())
        .count();
    info!(
        class_id = %roster.class_id,
        ranked = assembled.len() - no_data,
        no_data,
        "reporting pass complete"
    );
    Ok(assembled)
}

async fn aggregate_one(
    student_id: &str,
    roster: &ClassRoster,
    source: &dyn MarkSource,
    formula: &Formula,
    scale: &GradeScale,
) -> anyhow::Result<StudentResult> {
    let mut per_assignment: Vec<(SubjectAssignment, Vec<AssessmentMark>)> =
        Vec::with_capacity(roster.assignments.len());
    for assignment in &roster.assignments {
        let marks = source.marks_for_student(student_id, assignment).await?;
        per_assignment.push((assignment.clone(), marks));
    }
    Ok(aggregate_student_result(
        student_id,
        roster,
        &per_assignment,
        formula,
        scale,
    ))
}
