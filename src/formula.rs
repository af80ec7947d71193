use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A site-configurable weighting formula. Weights are keyed by assessment
/// type label and need not be pre-normalized; the engine renormalizes over
/// the types actually graded. Read-only to the engine; lifecycle belongs to
/// the admin collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub weights: HashMap<String, f64>,
    pub passing_score: f64,
    pub is_active: bool,
}

impl Formula {
    /// Weight for one assessment type, matched case-insensitively the way
    /// mark-entry UIs actually spell these labels.
    pub fn weight_for(&self, test_type: &str) -> Option<f64> {
        let wanted = test_type.trim().to_ascii_lowercase();
        self.weights
            .iter()
            .find(|(label, _)| label.trim().to_ascii_lowercase() == wanted)
            .map(|(_, w)| *w)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.weights.is_empty() {
            return Err(EngineError::invalid_formula(&self.id, "no weights defined"));
        }
        let mut positive = 0usize;
        for (label, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::invalid_formula(
                    &self.id,
                    format!("weight for '{}' must be a non-negative number", label),
                ));
            }
            if *weight > 0.0 {
                positive += 1;
            }
        }
        if positive == 0 {
            return Err(EngineError::invalid_formula(
                &self.id,
                "at least one weight must be positive",
            ));
        }
        if !self.passing_score.is_finite()
            || self.passing_score < 0.0
            || self.passing_score > 100.0
        {
            return Err(EngineError::invalid_formula(
                &self.id,
                format!("passing score {} outside [0, 100]", self.passing_score),
            ));
        }
        Ok(())
    }
}

/// How a pass names the formula it wants: an explicit id, or whichever
/// definition is flagged active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaRef {
    Active,
    Id(String),
}

/// Validated set of formula definitions for one computation pass.
///
/// Loading fails on the first definition that could not produce a defined
/// score; callers never see a half-usable formula.
#[derive(Debug, Clone)]
pub struct FormulaRegistry {
    formulas: Vec<Formula>,
}

impl FormulaRegistry {
    pub fn load(formulas: Vec<Formula>) -> Result<Self, EngineError> {
        for formula in &formulas {
            formula.validate()?;
        }
        let active: Vec<&Formula> = formulas.iter().filter(|f| f.is_active).collect();
        if active.len() > 1 {
            let ids: Vec<&str> = active.iter().map(|f| f.id.as_str()).collect();
            return Err(EngineError::invalid_formula(
                ids.join(","),
                "more than one formula is marked active",
            ));
        }
        Ok(FormulaRegistry { formulas })
    }

    pub fn resolve(&self, wanted: &FormulaRef) -> Result<&Formula, EngineError> {
        match wanted {
            FormulaRef::Active => self
                .formulas
                .iter()
                .find(|f| f.is_active)
                .ok_or(EngineError::NoActiveFormula),
            FormulaRef::Id(id) => self
                .formulas
                .iter()
                .find(|f| &f.id == id)
                .ok_or_else(|| EngineError::FormulaNotFound { id: id.clone() }),
        }
    }

    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }
}
