//! Debug and trace reporting
//!
//! Formatting and aggregation of values the other stages already produced.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{LineIdentity, Macro, MacroTotals, UserTargets};

use super::classify::{Classification, GroupCounts, ReducibleCandidate};
use super::corrector::{OptimizationStep, Termination};

/// Ingredient counts overall and per group
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientDetails {
    pub total_ingredients: usize,
    pub reducible_ingredients: usize,
    pub optimized_ingredients: usize,
    pub by_unit_type: BTreeMap<String, GroupCounts>,
    pub by_meal_type: BTreeMap<String, GroupCounts>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationDebug {
    pub base_plan_calories: f64,
    pub profile: UserTargets,
    pub termination: Termination,
    pub iterations: usize,
    /// The candidate pool as it stood before correction
    pub reducible_ingredients: Vec<ReducibleCandidate>,
    pub optimization_steps: Vec<OptimizationStep>,
    pub ingredient_details: IngredientDetails,
}

/// Combine classification counts with the lines the corrector actually touched
pub fn ingredient_details(
    classification: &Classification,
    steps: &[OptimizationStep],
) -> IngredientDetails {
    let optimized: BTreeSet<&LineIdentity> = steps.iter().map(|s| &s.identity).collect();

    let mut by_unit_type = classification.by_unit_type.clone();
    let mut by_meal_type = classification.by_meal_type.clone();
    for candidate in classification
        .candidates
        .iter()
        .filter(|c| optimized.contains(&c.identity))
    {
        if let Some(counts) = by_unit_type.get_mut(candidate.unit_type.as_str()) {
            counts.optimized += 1;
        }
        if let Some(counts) = by_meal_type.get_mut(candidate.identity.meal_type.as_str()) {
            counts.optimized += 1;
        }
    }

    IngredientDetails {
        total_ingredients: classification.total_lines,
        reducible_ingredients: classification.candidates.len(),
        optimized_ingredients: optimized.len(),
        by_unit_type,
        by_meal_type,
    }
}

/// Human readable summary of one reduction
pub fn describe_impact(
    identity: &LineIdentity,
    focus: Macro,
    reduction: f64,
    unit: &str,
    before: &MacroTotals,
    after: &MacroTotals,
) -> String {
    let delta = *before - *after;
    let changes: Vec<String> = Macro::ALL
        .iter()
        .map(|m| match m {
            Macro::Calories => format!("-{:.1} {}", delta.get(*m), m.unit()),
            _ => format!("-{:.1} {} {}", delta.get(*m), m.unit(), m.as_str()),
        })
        .collect();
    format!(
        "Reduced {} (day {}, {}) by {:.1} {} to lower {}: {}",
        identity.ingredient_name,
        identity.day,
        identity.meal_type.as_str(),
        reduction,
        unit,
        focus.as_str(),
        changes.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;

    #[test]
    fn test_describe_impact() {
        let identity = LineIdentity {
            day: 2,
            meal_type: MealType::Dinner,
            ingredient_name: "Rice".to_string(),
        };
        let text = describe_impact(
            &identity,
            Macro::Carbs,
            25.0,
            "g",
            &MacroTotals::new(100.0, 0.0, 25.0, 0.0),
            &MacroTotals::new(0.0, 0.0, 0.0, 0.0),
        );
        assert_eq!(
            text,
            "Reduced Rice (day 2, dinner) by 25.0 g to lower carbs: -100.0 kcal, -0.0 g protein, -25.0 g carbs, -0.0 g fat"
        );
    }
}
