//! Uniform scaling toward the target calorie level

use crate::models::MealPlan;

use super::OptimizeError;

/// `target / base`; a non-positive base has no meaningful factor
pub fn scale_factor(base_calories: f64, target_calories: f64) -> Result<f64, OptimizeError> {
    if !base_calories.is_finite() || base_calories <= 0.0 {
        return Err(OptimizeError::DegenerateBaseTotals { base_calories });
    }
    if !target_calories.is_finite() || target_calories < 0.0 {
        return Err(OptimizeError::InvalidTargets(format!(
            "target calories must be finite and non-negative, got {}",
            target_calories
        )));
    }
    Ok(target_calories / base_calories)
}

/// Copy of `plan` with every amount multiplied by `factor`.
///
/// Minimum amounts are absolute floors and stay as authored. A line scaled
/// below its floor is clamped back up to it, which leaves it non-reducible.
pub fn scale_plan(plan: &MealPlan, factor: f64) -> MealPlan {
    let mut scaled = plan.clone();
    for day in &mut scaled.days {
        for meal in &mut day.meals {
            for line in &mut meal.ingredients {
                line.amount *= factor;
                if let Some(min) = line.minimum_amount {
                    line.amount = line.amount.max(min);
                }
            }
        }
    }
    scaled
}
