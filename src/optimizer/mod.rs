//! Meal plan macro optimizer
//!
//! Scales a template plan to a user's calorie target, then greedily trims
//! reducible ingredients until the macros are within tolerance of the targets.
//! Everything here is a pure function of the plan, the targets and the config;
//! loading happens in the tools layer through [`crate::db::PlanSource`] and
//! [`crate::db::ProfileSource`].

pub mod accuracy;
pub mod aggregate;
pub mod classify;
pub mod corrector;
mod error;
pub mod report;
pub mod scale;

pub use accuracy::{evaluate, macro_accuracy, MacroAccuracy};
pub use aggregate::{day_totals, meal_totals, plan_totals};
pub use classify::{classify, Classification, GroupCounts, LinePosition, ReducibleCandidate};
pub use corrector::{correct, overages, Correction, OptimizationStep, Termination};
pub use error::OptimizeError;
pub use report::{IngredientDetails, OptimizationDebug};
pub use scale::{scale_factor, scale_plan};

use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::models::{Macro, MacroTotals, MealPlan, UserTargets};

/// Everything the optimizer produces for one plan and one user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub scale_factor: f64,
    pub original_totals: MacroTotals,
    pub scaled_totals: MacroTotals,
    pub optimized_totals: MacroTotals,
    pub target_totals: MacroTotals,
    /// Signed `target - optimized`; negative values are remaining excess
    pub overages: MacroTotals,
    pub optimizations: Vec<OptimizationStep>,
    pub accuracy: MacroAccuracy,
    pub optimized_plan: MealPlan,
    pub debug: OptimizationDebug,
}

/// Scale and correct `template` toward `targets`.
///
/// The template is never modified; the optimized plan is a fresh snapshot.
pub fn optimize(
    template: &MealPlan,
    targets: &UserTargets,
    config: &OptimizerConfig,
) -> Result<OptimizationResult, OptimizeError> {
    template.validate().map_err(OptimizeError::InvalidPlan)?;

    let target_totals = targets.as_totals();
    if !target_totals.is_finite() || !target_totals.is_non_negative() {
        return Err(OptimizeError::InvalidTargets(
            "targets must be finite and non-negative".to_string(),
        ));
    }

    let original_totals = plan_totals(template);
    let factor = scale_factor(original_totals.calories, targets.target_calories)?;
    let scaled = scale_plan(template, factor);
    let scaled_totals = plan_totals(&scaled);

    let classification = classify(&scaled);
    let correction = correct(scaled, &classification.candidates, &target_totals, config);

    let accuracy = evaluate(&correction.totals, &target_totals);
    let details = report::ingredient_details(&classification, &correction.steps);

    tracing::info!(
        "Plan {} scaled by {:.4}: {} of {} candidates trimmed in {} steps ({})",
        template.id,
        factor,
        details.optimized_ingredients,
        details.reducible_ingredients,
        correction.steps.len(),
        correction.termination.as_str()
    );
    if correction.termination != Termination::OnTarget {
        tracing::warn!(
            "Plan {} only partially corrected ({}): {}",
            template.id,
            correction.termination.as_str(),
            accuracy_summary(&accuracy)
        );
    }

    Ok(OptimizationResult {
        scale_factor: factor,
        original_totals,
        scaled_totals,
        optimized_totals: correction.totals,
        target_totals,
        overages: target_totals - correction.totals,
        optimizations: correction.steps.clone(),
        accuracy,
        optimized_plan: correction.plan,
        debug: OptimizationDebug {
            base_plan_calories: original_totals.calories,
            profile: *targets,
            termination: correction.termination,
            iterations: correction.iterations,
            reducible_ingredients: classification.candidates,
            optimization_steps: correction.steps,
            ingredient_details: details,
        },
    })
}

/// `calories 98.5%, protein 100.0%, ...` for log lines
fn accuracy_summary(accuracy: &MacroAccuracy) -> String {
    Macro::ALL
        .iter()
        .map(|m| format!("{} {:.1}%", m.as_str(), accuracy.get(*m)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{IngredientLine, MacroTotals, MealPlan, MealType, PlanDay, PlanMeal};

    /// Build a line; nutrition is `(calories, protein, carbs, fat)` per unit
    pub fn line(
        name: &str,
        unit: &str,
        amount: f64,
        per_unit: (f64, f64, f64, f64),
        minimum_amount: Option<f64>,
    ) -> IngredientLine {
        IngredientLine {
            ingredient_id: 0,
            ingredient_name: name.to_string(),
            unit: unit.to_string(),
            amount,
            per_unit: MacroTotals::new(per_unit.0, per_unit.1, per_unit.2, per_unit.3),
            minimum_amount,
        }
    }

    /// Meals for the same consecutive day number are merged into one day
    pub fn plan_of(meals: Vec<(i64, MealType, Vec<IngredientLine>)>) -> MealPlan {
        let mut days: Vec<PlanDay> = Vec::new();
        for (day_number, meal_type, ingredients) in meals {
            let meal = PlanMeal { meal_type, name: None, ingredients };
            match days.last_mut() {
                Some(day) if day.day_number == day_number => day.meals.push(meal),
                _ => days.push(PlanDay { day_number, label: None, meals: vec![meal] }),
            }
        }
        MealPlan {
            id: 1,
            name: "test plan".to_string(),
            reference_calories: None,
            days,
        }
    }
}
