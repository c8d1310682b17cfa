//! Reducible-ingredient classification
//!
//! A line is reducible when it has a minimum amount strictly below its
//! current amount. The grouping by unit type and meal type only feeds the
//! debug report; it never influences correction.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{IngredientLine, LineIdentity, MacroTotals, MealPlan};
use crate::nutrition::{categorize_unit, UnitCategory};

/// Indices of a line inside a plan snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePosition {
    pub day: usize,
    pub meal: usize,
    pub line: usize,
}

impl LinePosition {
    pub fn get<'a>(&self, plan: &'a MealPlan) -> &'a IngredientLine {
        &plan.days[self.day].meals[self.meal].ingredients[self.line]
    }

    pub fn get_mut<'a>(&self, plan: &'a mut MealPlan) -> &'a mut IngredientLine {
        &mut plan.days[self.day].meals[self.meal].ingredients[self.line]
    }
}

/// A line eligible for trimming, as it stood when classified
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReducibleCandidate {
    #[serde(skip)]
    pub position: LinePosition,
    #[serde(flatten)]
    pub identity: LineIdentity,
    pub unit: String,
    pub unit_type: UnitCategory,
    pub current_amount: f64,
    pub min_amount: f64,
    pub reduction_potential: f64,
    pub nutrition_per_unit: MacroTotals,
    pub calories_per_unit: f64,
}

/// Line counts for one unit type or meal type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCounts {
    pub total: usize,
    pub reducible: usize,
    pub optimized: usize,
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub candidates: Vec<ReducibleCandidate>,
    pub total_lines: usize,
    pub by_unit_type: BTreeMap<String, GroupCounts>,
    pub by_meal_type: BTreeMap<String, GroupCounts>,
}

/// Reduction potential of a line, or `None` if it is not reducible
pub fn reduction_potential(line: &IngredientLine) -> Option<f64> {
    match line.minimum_amount {
        Some(min) if line.amount > min => Some(line.amount - min),
        _ => None,
    }
}

/// Build the candidate pool in plan traversal order
pub fn classify(plan: &MealPlan) -> Classification {
    let mut candidates = Vec::new();
    let mut total_lines = 0;
    let mut by_unit_type: BTreeMap<String, GroupCounts> = BTreeMap::new();
    let mut by_meal_type: BTreeMap<String, GroupCounts> = BTreeMap::new();

    for (d, day) in plan.days.iter().enumerate() {
        for (m, meal) in day.meals.iter().enumerate() {
            for (l, line) in meal.ingredients.iter().enumerate() {
                total_lines += 1;
                let unit_type = categorize_unit(&line.unit);
                let potential = reduction_potential(line);

                for counts in [
                    by_unit_type.entry(unit_type.as_str().to_string()).or_default(),
                    by_meal_type.entry(meal.meal_type.as_str().to_string()).or_default(),
                ] {
                    counts.total += 1;
                    if potential.is_some() {
                        counts.reducible += 1;
                    }
                }

                let (Some(potential), Some(min_amount)) = (potential, line.minimum_amount) else {
                    continue;
                };

                candidates.push(ReducibleCandidate {
                    position: LinePosition { day: d, meal: m, line: l },
                    identity: LineIdentity {
                        day: day.day_number,
                        meal_type: meal.meal_type,
                        ingredient_name: line.ingredient_name.clone(),
                    },
                    unit: line.unit.clone(),
                    unit_type,
                    current_amount: line.amount,
                    min_amount,
                    reduction_potential: potential,
                    nutrition_per_unit: line.per_unit,
                    calories_per_unit: line.per_unit.calories,
                });
            }
        }
    }

    Classification {
        candidates,
        total_lines,
        by_unit_type,
        by_meal_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;
    use crate::optimizer::test_support::{line, plan_of};

    #[test]
    fn test_only_lines_above_their_minimum_are_candidates() {
        let plan = plan_of(vec![(
            1,
            MealType::Lunch,
            vec![
                line("Rice", "g", 200.0, (1.3, 0.03, 0.28, 0.0), Some(50.0)),
                line("Chicken", "g", 150.0, (1.65, 0.31, 0.0, 0.036), None),
                line("Pesto", "tbsp", 2.0, (80.0, 1.0, 1.0, 8.0), Some(2.0)),
            ],
        )]);

        let result = classify(&plan);
        assert_eq!(result.total_lines, 3);
        assert_eq!(result.candidates.len(), 1);

        let rice = &result.candidates[0];
        assert_eq!(rice.identity.ingredient_name, "Rice");
        assert_eq!(rice.unit_type, UnitCategory::Weight);
        assert!((rice.reduction_potential - 150.0).abs() < 1e-12);
        assert!((rice.calories_per_unit - 1.3).abs() < 1e-12);
        assert_eq!(rice.position, LinePosition { day: 0, meal: 0, line: 0 });
    }

    #[test]
    fn test_grouping_counts() {
        let plan = plan_of(vec![
            (
                1,
                MealType::Breakfast,
                vec![
                    line("Oats", "g", 80.0, (3.8, 0.13, 0.67, 0.07), Some(30.0)),
                    line("Milk", "ml", 200.0, (0.42, 0.034, 0.05, 0.01), None),
                ],
            ),
            (
                1,
                MealType::Snack,
                vec![line("Egg", "piece", 2.0, (70.0, 6.0, 0.5, 5.0), Some(1.0))],
            ),
        ]);

        let result = classify(&plan);
        assert_eq!(
            result.by_unit_type.get("weight"),
            Some(&GroupCounts { total: 1, reducible: 1, optimized: 0 })
        );
        assert_eq!(
            result.by_unit_type.get("volume"),
            Some(&GroupCounts { total: 1, reducible: 0, optimized: 0 })
        );
        assert_eq!(result.by_unit_type.get("count").map(|c| c.reducible), Some(1));
        assert_eq!(
            result.by_meal_type.get("breakfast"),
            Some(&GroupCounts { total: 2, reducible: 1, optimized: 0 })
        );
        assert_eq!(result.by_meal_type.get("snack").map(|c| c.total), Some(1));
    }
}
