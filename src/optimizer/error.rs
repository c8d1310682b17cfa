//! Optimizer error types

use thiserror::Error;

use crate::db::DbError;

/// Request-fatal failures. Partial corrections are not errors; they are
/// reported through [`super::Termination`].
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Meal plan not found: {0}")]
    PlanNotFound(i64),

    #[error("User profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Base plan totals {base_calories} kcal; scale factor is undefined (division by zero)")]
    DegenerateBaseTotals { base_calories: f64 },

    #[error("Invalid meal plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid targets: {0}")]
    InvalidTargets(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl OptimizeError {
    /// Stable machine-readable name for responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizeError::PlanNotFound(_) => "plan_not_found",
            OptimizeError::ProfileNotFound(_) => "profile_not_found",
            OptimizeError::DegenerateBaseTotals { .. } => "degenerate_base_totals",
            OptimizeError::InvalidPlan(_) => "invalid_plan",
            OptimizeError::InvalidTargets(_) => "invalid_targets",
            OptimizeError::Storage(_) => "storage",
        }
    }
}
