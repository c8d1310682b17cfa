//! Plan aggregation
//!
//! Totals are always accumulated day-major, meal-minor, ingredient-innermost,
//! so the same plan sums to bit-identical values on every run.

use crate::models::{MacroTotals, MealPlan, PlanDay, PlanMeal};

pub fn meal_totals(meal: &PlanMeal) -> MacroTotals {
    meal.ingredients.iter().map(|line| line.contribution()).sum()
}

pub fn day_totals(day: &PlanDay) -> MacroTotals {
    day.meals.iter().map(meal_totals).sum()
}

/// Sum calories, protein, carbs and fat over every line of the plan
pub fn plan_totals(plan: &MealPlan) -> MacroTotals {
    plan.lines().map(|(_, _, line)| line.contribution()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::test_support::{line, plan_of};
    use crate::models::MealType;

    #[test]
    fn test_plan_totals_sum_all_days() {
        let plan = plan_of(vec![
            (1, MealType::Breakfast, vec![line("Egg", "piece", 2.0, (70.0, 6.0, 0.5, 5.0), None)]),
            (2, MealType::Lunch, vec![line("Rice", "g", 100.0, (1.3, 0.0, 0.28, 0.0), Some(50.0))]),
        ]);

        let totals = plan_totals(&plan);
        assert!((totals.calories - 270.0).abs() < 1e-9);
        assert!((totals.protein - 12.0).abs() < 1e-9);
        assert!((totals.carbs - 29.0).abs() < 1e-9);
        assert!((totals.fat - 10.0).abs() < 1e-9);

        let first = day_totals(&plan.days[0]);
        assert!((first.calories - 140.0).abs() < 1e-9);
        assert_eq!(meal_totals(&plan.days[1].meals[0]), day_totals(&plan.days[1]));
    }

    #[test]
    fn test_empty_plan_is_zero() {
        let plan = plan_of(vec![]);
        assert_eq!(plan_totals(&plan), MacroTotals::zero());
    }
}
