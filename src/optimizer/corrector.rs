//! Greedy corrector
//!
//! Trims reducible lines until every macro is within tolerance of its target,
//! the candidate pool can no longer help, or the iteration cap is hit. The
//! correction is subtractive only: a macro under target is never raised.
//!
//! Candidates are visited in plan order with a round-robin cursor, so the
//! step trace is stable for identical inputs and easy to follow.

use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::models::{LineIdentity, Macro, MacroTotals, MealPlan};

use super::aggregate::plan_totals;
use super::classify::ReducibleCandidate;
use super::report::describe_impact;

/// Amounts below this are treated as zero
const EPSILON: f64 = 1e-9;

/// Why the corrector stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    OnTarget,
    NoReducibleCandidates,
    IterationLimitReached,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::OnTarget => "on_target",
            Termination::NoReducibleCandidates => "no_reducible_candidates",
            Termination::IterationLimitReached => "iteration_limit_reached",
        }
    }
}

/// One committed reduction; never modified after it is recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStep {
    pub step_index: usize,
    #[serde(flatten)]
    pub identity: LineIdentity,
    pub target_macro: Macro,
    pub original_amount: f64,
    pub optimized_amount: f64,
    pub reduction: f64,
    pub unit: String,
    pub nutrition_before: MacroTotals,
    pub nutrition_after: MacroTotals,
    pub impact: String,
}

#[derive(Debug, Clone)]
pub struct Correction {
    pub plan: MealPlan,
    pub totals: MacroTotals,
    pub steps: Vec<OptimizationStep>,
    pub termination: Termination,
    pub iterations: usize,
}

/// Positive excess of each macro over its target
pub fn overages(current: &MacroTotals, targets: &MacroTotals) -> MacroTotals {
    MacroTotals::from_fn(|m| (current.get(m) - targets.get(m)).max(0.0))
}

/// Allowed overage for a macro: the larger of the relative and absolute tolerance
pub fn tolerance(target: f64, config: &OptimizerConfig) -> f64 {
    (target.abs() * config.tolerance_percent / 100.0)
        .max(config.tolerance_absolute)
        .max(EPSILON)
}

/// Out-of-tolerance macros, largest relative overage first; ties keep the
/// fixed calories, protein, carbs, fat order
fn macros_to_fix(over: &MacroTotals, targets: &MacroTotals, config: &OptimizerConfig) -> Vec<Macro> {
    let mut pending: Vec<(Macro, f64)> = Macro::ALL
        .iter()
        .filter(|m| over.get(**m) > tolerance(targets.get(**m), config))
        .map(|m| {
            let target = targets.get(*m);
            let relative = if target > 0.0 { over.get(*m) / target } else { f64::INFINITY };
            (*m, relative)
        })
        .collect();
    // Stable sort keeps declaration order for equal keys
    pending.sort_by(|a, b| b.1.total_cmp(&a.1));
    pending.into_iter().map(|(m, _)| m).collect()
}

/// Next candidate at or after `start` (wrapping) that can lower `focus`
fn next_candidate(
    plan: &MealPlan,
    candidates: &[ReducibleCandidate],
    start: usize,
    focus: Macro,
) -> Option<usize> {
    let n = candidates.len();
    (0..n).map(|k| (start + k) % n).find(|&idx| {
        let candidate = &candidates[idx];
        let line = candidate.position.get(plan);
        line.per_unit.get(focus) > 0.0 && line.amount - candidate.min_amount > EPSILON
    })
}

/// Run the correction loop over an already scaled plan.
///
/// `candidates` must come from classifying `plan`; their positions index into it.
pub fn correct(
    mut plan: MealPlan,
    candidates: &[ReducibleCandidate],
    targets: &MacroTotals,
    config: &OptimizerConfig,
) -> Correction {
    let step_sizes: Vec<f64> = candidates
        .iter()
        .map(|c| (c.reduction_potential * config.step_fraction).max(config.min_step))
        .collect();

    let mut totals = plan_totals(&plan);
    let mut steps: Vec<OptimizationStep> = Vec::new();
    let mut cursor = 0;
    let mut iterations = 0;

    let termination = loop {
        let over = overages(&totals, targets);
        let pending = macros_to_fix(&over, targets, config);
        if pending.is_empty() {
            break Termination::OnTarget;
        }
        if iterations >= config.max_iterations {
            break Termination::IterationLimitReached;
        }

        let choice = pending.iter().find_map(|m| {
            next_candidate(&plan, candidates, cursor, *m).map(|idx| (*m, idx))
        });
        let Some((focus, idx)) = choice else {
            break Termination::NoReducibleCandidates;
        };
        iterations += 1;

        let candidate = &candidates[idx];
        let line = candidate.position.get_mut(&mut plan);
        let remaining = line.amount - candidate.min_amount;
        let needed = over.get(focus) / line.per_unit.get(focus);
        let step = step_sizes[idx].min(remaining).min(needed);

        let original_amount = line.amount;
        let nutrition_before = line.contribution();
        line.amount = (line.amount - step).max(candidate.min_amount);
        let optimized_amount = line.amount;
        let nutrition_after = line.contribution();
        let unit = line.unit.clone();

        totals = plan_totals(&plan);

        let step_index = steps.len() + 1;
        let reduction = original_amount - optimized_amount;
        tracing::debug!(
            "step {}: {} day {} {} {:.2} -> {:.2} {} for {}",
            step_index,
            candidate.identity.ingredient_name,
            candidate.identity.day,
            candidate.identity.meal_type.as_str(),
            original_amount,
            optimized_amount,
            unit,
            focus.as_str()
        );

        steps.push(OptimizationStep {
            step_index,
            identity: candidate.identity.clone(),
            target_macro: focus,
            original_amount,
            optimized_amount,
            reduction,
            impact: describe_impact(
                &candidate.identity,
                focus,
                reduction,
                &unit,
                &nutrition_before,
                &nutrition_after,
            ),
            unit,
            nutrition_before,
            nutrition_after,
        });

        cursor = idx + 1;
    };

    Correction {
        plan,
        totals,
        steps,
        termination,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;
    use crate::optimizer::classify::classify;
    use crate::optimizer::test_support::{line, plan_of};

    fn run(plan: MealPlan, targets: MacroTotals, config: &OptimizerConfig) -> Correction {
        let pool = classify(&plan).candidates;
        correct(plan, &pool, &targets, config)
    }

    fn carb_plan() -> MealPlan {
        plan_of(vec![
            (
                1,
                MealType::Breakfast,
                vec![
                    line("Oats", "g", 100.0, (4.0, 0.0, 1.0, 0.0), Some(20.0)),
                    line("Whey", "g", 50.0, (4.0, 1.0, 0.0, 0.0), None),
                ],
            ),
            (
                1,
                MealType::Dinner,
                vec![line("Rice", "g", 100.0, (4.0, 0.0, 1.0, 0.0), Some(20.0))],
            ),
        ])
    }

    #[test]
    fn test_already_on_target_takes_no_steps() {
        let config = OptimizerConfig::default();
        let result = run(carb_plan(), MacroTotals::new(1000.0, 50.0, 200.0, 0.0), &config);
        assert_eq!(result.termination, Termination::OnTarget);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_round_robin_in_plan_order() {
        let config = OptimizerConfig::default();
        // 40 g of carbs too many; each candidate step is 0.25 * 80 = 20
        let result = run(carb_plan(), MacroTotals::new(1000.0, 50.0, 160.0, 0.0), &config);

        assert_eq!(result.termination, Termination::OnTarget);
        let names: Vec<&str> = result
            .steps
            .iter()
            .map(|s| s.identity.ingredient_name.as_str())
            .collect();
        assert_eq!(names, vec!["Oats", "Rice"]);
        assert!(result.steps.iter().all(|s| s.target_macro == Macro::Carbs));
        assert!((result.totals.carbs - 160.0).abs() < 1e-9);
        assert_eq!(result.steps[0].step_index, 1);
        assert_eq!(result.steps[1].step_index, 2);
    }

    #[test]
    fn test_round_robin_crosses_days_and_wraps() {
        let config = OptimizerConfig::default();
        // Day 1 dinner comes before day 2 breakfast; each step is 0.25 * 80 = 20
        let plan = plan_of(vec![
            (1, MealType::Dinner, vec![line("Oats", "g", 100.0, (4.0, 0.0, 1.0, 0.0), Some(20.0))]),
            (2, MealType::Breakfast, vec![line("Rice", "g", 100.0, (4.0, 0.0, 1.0, 0.0), Some(20.0))]),
            (2, MealType::Lunch, vec![line("Pasta", "g", 100.0, (4.0, 0.0, 1.0, 0.0), Some(20.0))]),
        ]);
        // 80 g of carbs too many: three steps, then back to day 1
        let result = run(plan, MacroTotals::new(2000.0, 0.0, 220.0, 0.0), &config);

        assert_eq!(result.termination, Termination::OnTarget);
        let trace: Vec<(&str, i64)> = result
            .steps
            .iter()
            .map(|s| (s.identity.ingredient_name.as_str(), s.identity.day))
            .collect();
        assert_eq!(trace, vec![("Oats", 1), ("Rice", 2), ("Pasta", 2), ("Oats", 1)]);
        assert!((result.plan.days[0].meals[0].ingredients[0].amount - 60.0).abs() < 1e-9);
        assert!((result.totals.carbs - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_floor_is_never_crossed() {
        let config = OptimizerConfig::default();
        let result = run(carb_plan(), MacroTotals::new(0.0, 0.0, 0.0, 0.0), &config);

        assert_eq!(result.termination, Termination::NoReducibleCandidates);
        for step in &result.steps {
            assert!(step.optimized_amount >= 20.0 - 1e-12);
            assert!(step.optimized_amount >= 0.0);
        }
        let oats = &result.plan.days[0].meals[0].ingredients[0];
        assert!((oats.amount - 20.0).abs() < 1e-9);
        // Whey has no minimum and is never touched
        assert_eq!(result.plan.days[0].meals[0].ingredients[1].amount, 50.0);
    }

    #[test]
    fn test_iteration_cap_reports_partial_correction() {
        let config = OptimizerConfig {
            max_iterations: 1,
            ..OptimizerConfig::default()
        };
        let result = run(carb_plan(), MacroTotals::new(1000.0, 50.0, 100.0, 0.0), &config);

        assert_eq!(result.termination, Termination::IterationLimitReached);
        assert_eq!(result.steps.len(), 1);
        assert!(result.totals.carbs > 100.0);
    }

    #[test]
    fn test_targeted_overage_never_increases() {
        let config = OptimizerConfig::default();
        let plan = plan_of(vec![(
            1,
            MealType::Lunch,
            vec![
                line("Pasta", "g", 300.0, (3.5, 0.12, 0.7, 0.015), Some(60.0)),
                line("Cheese", "g", 80.0, (4.0, 0.25, 0.01, 0.33), Some(10.0)),
                line("Olive Oil", "ml", 30.0, (8.0, 0.0, 0.0, 0.9), Some(5.0)),
            ],
        )]);
        let targets = MacroTotals::new(900.0, 40.0, 120.0, 20.0);
        let pool = classify(&plan).candidates;
        let result = correct(plan.clone(), &pool, &targets, &config);

        // Replay the trace against the starting plan and check each step
        let mut replay = plan;
        for step in &result.steps {
            let before = overages(&plan_totals(&replay), &targets).get(step.target_macro);
            let pos = pool
                .iter()
                .find(|c| c.identity == step.identity)
                .map(|c| c.position)
                .unwrap();
            pos.get_mut(&mut replay).amount = step.optimized_amount;
            let after = overages(&plan_totals(&replay), &targets).get(step.target_macro);
            assert!(after <= before + 1e-9);
        }
    }

    #[test]
    fn test_zero_target_macro_is_fixed_first() {
        let config = OptimizerConfig::default();
        let plan = plan_of(vec![(
            1,
            MealType::Snack,
            vec![
                line("Butter", "g", 10.0, (7.2, 0.0, 0.0, 0.8), Some(0.0)),
                line("Apple", "piece", 2.0, (95.0, 0.5, 25.0, 0.3), Some(1.0)),
            ],
        )]);
        let result = run(plan, MacroTotals::new(1000.0, 10.0, 100.0, 0.0), &config);

        assert_eq!(result.steps[0].target_macro, Macro::Fat);
        assert_eq!(result.steps[0].identity.ingredient_name, "Butter");
    }

    #[test]
    fn test_tolerance_uses_larger_bound() {
        let config = OptimizerConfig::default();
        assert!((tolerance(2400.0, &config) - 24.0).abs() < 1e-12);
        assert!((tolerance(50.0, &config) - 1.0).abs() < 1e-12);
    }
}
