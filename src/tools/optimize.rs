//! Plan optimization tool
//!
//! The boundary operation: plan id + user id in, JSON-shaped result out.
//! Failures never escape as errors; they become `success: false` bodies.

use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::db::{PlanSource, ProfileSource};
use crate::optimizer::{self, plan_totals, OptimizationResult, OptimizeError};

/// Context attached to a failed request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDebug {
    pub plan_id: i64,
    pub user_id: String,
    pub error_kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_plan_calories: Option<f64>,
}

/// Response for optimize_plan
#[derive(Debug, Serialize)]
pub struct OptimizePlanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<OptimizationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<FailureDebug>,
}

/// Load the plan and the user's targets, then run the optimizer
pub fn optimize_plan(
    plans: &impl PlanSource,
    profiles: &impl ProfileSource,
    plan_id: i64,
    user_id: &str,
    config: &OptimizerConfig,
) -> OptimizePlanResponse {
    let mut base_plan_calories = None;

    match run(plans, profiles, plan_id, user_id, config, &mut base_plan_calories) {
        Ok(result) => OptimizePlanResponse {
            success: true,
            data: Some(result),
            error: None,
            debug: None,
        },
        Err(e) => {
            tracing::warn!("optimize_plan failed for plan {} / user {}: {}", plan_id, user_id, e);
            OptimizePlanResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
                debug: Some(FailureDebug {
                    plan_id,
                    user_id: user_id.to_string(),
                    error_kind: e.kind(),
                    base_plan_calories,
                }),
            }
        }
    }
}

fn run(
    plans: &impl PlanSource,
    profiles: &impl ProfileSource,
    plan_id: i64,
    user_id: &str,
    config: &OptimizerConfig,
    base_plan_calories: &mut Option<f64>,
) -> Result<OptimizationResult, OptimizeError> {
    let plan = plans
        .fetch_plan(plan_id)?
        .ok_or(OptimizeError::PlanNotFound(plan_id))?;
    *base_plan_calories = Some(plan_totals(&plan).calories);

    let profile = profiles
        .fetch_profile(user_id)?
        .ok_or_else(|| OptimizeError::ProfileNotFound(user_id.to_string()))?;

    tracing::info!("Optimizing plan {} ('{}') for user {}", plan.id, plan.name, user_id);
    optimizer::optimize(&plan, &profile.targets, config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::db::{Database, DbResult, SqliteSources};
    use crate::models::{
        IngredientLine, MacroTotals, MealPlan, MealType, PlanDay, PlanMeal, PlanDocument,
        UserProfile, UserTargets,
    };

    #[derive(Default)]
    struct MemorySources {
        plans: HashMap<i64, MealPlan>,
        profiles: HashMap<String, UserProfile>,
    }

    impl PlanSource for MemorySources {
        fn fetch_plan(&self, plan_id: i64) -> DbResult<Option<MealPlan>> {
            Ok(self.plans.get(&plan_id).cloned())
        }
    }

    impl ProfileSource for MemorySources {
        fn fetch_profile(&self, user_id: &str) -> DbResult<Option<UserProfile>> {
            Ok(self.profiles.get(user_id).cloned())
        }
    }

    fn rice_plan(calories_per_gram: f64) -> MealPlan {
        MealPlan {
            id: 7,
            name: "Rice bowl".to_string(),
            reference_calories: Some(2000.0),
            days: vec![PlanDay {
                day_number: 1,
                label: None,
                meals: vec![PlanMeal {
                    meal_type: MealType::Lunch,
                    name: None,
                    ingredients: vec![IngredientLine {
                        ingredient_id: 1,
                        ingredient_name: "Rice".to_string(),
                        unit: "g".to_string(),
                        amount: 500.0,
                        per_unit: MacroTotals::new(calories_per_gram, 0.0, 1.0, 0.0),
                        minimum_amount: Some(100.0),
                    }],
                }],
            }],
        }
    }

    fn profile(carbs: f64) -> UserProfile {
        UserProfile {
            user_id: "u-1".to_string(),
            display_name: None,
            targets: UserTargets {
                target_calories: 1600.0,
                target_protein: 0.0,
                target_carbs: carbs,
                target_fat: 0.0,
            },
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn sources(plan: MealPlan, profile: UserProfile) -> MemorySources {
        let mut s = MemorySources::default();
        s.plans.insert(plan.id, plan);
        s.profiles.insert(profile.user_id.clone(), profile);
        s
    }

    #[test]
    fn test_success_body_shape() {
        let s = sources(rice_plan(4.0), profile(300.0));
        let response = optimize_plan(&s, &s, 7, "u-1", &OptimizerConfig::default());
        assert!(response.success);

        let json = serde_json::to_value(&response).unwrap();
        let data = &json["data"];
        assert!((data["scaleFactor"].as_f64().unwrap() - 0.8).abs() < 1e-12);
        for key in [
            "originalTotals", "scaledTotals", "optimizedTotals", "targetTotals", "overages",
            "optimizations", "accuracy", "optimizedPlan",
        ] {
            assert!(!data[key].is_null(), "missing {}", key);
        }
        let debug = &data["debug"];
        assert_eq!(debug["basePlanCalories"].as_f64(), Some(2000.0));
        assert_eq!(debug["profile"]["targetCarbs"].as_f64(), Some(300.0));
        assert_eq!(debug["termination"], "onTarget");
        assert_eq!(debug["reducibleIngredients"][0]["ingredientName"], "Rice");
        assert_eq!(debug["reducibleIngredients"][0]["mealType"], "lunch");
        assert_eq!(debug["ingredientDetails"]["totalIngredients"], 1);
        assert!(debug["optimizationSteps"][0]["impact"].as_str().unwrap().starts_with("Reduced Rice"));
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_missing_plan() {
        let s = sources(rice_plan(4.0), profile(300.0));
        let response = optimize_plan(&s, &s, 99, "u-1", &OptimizerConfig::default());
        assert!(!response.success);
        assert!(response.data.is_none());
        let debug = response.debug.unwrap();
        assert_eq!(debug.error_kind, "plan_not_found");
        assert_eq!(debug.base_plan_calories, None);
    }

    #[test]
    fn test_missing_profile_keeps_base_calories() {
        let s = sources(rice_plan(4.0), profile(300.0));
        let response = optimize_plan(&s, &s, 7, "nobody", &OptimizerConfig::default());
        assert!(!response.success);
        assert!(response.error.unwrap().contains("nobody"));
        let debug = response.debug.unwrap();
        assert_eq!(debug.error_kind, "profile_not_found");
        assert_eq!(debug.base_plan_calories, Some(2000.0));
    }

    #[test]
    fn test_zero_calorie_plan_fails_cleanly() {
        let s = sources(rice_plan(0.0), profile(300.0));
        let response = optimize_plan(&s, &s, 7, "u-1", &OptimizerConfig::default());
        assert!(!response.success);
        assert_eq!(response.debug.unwrap().error_kind, "degenerate_base_totals");
    }

    #[test]
    fn test_iteration_limit_is_still_success() {
        let s = sources(rice_plan(4.0), profile(150.0));
        let config = OptimizerConfig {
            max_iterations: 1,
            ..OptimizerConfig::default()
        };
        let response = optimize_plan(&s, &s, 7, "u-1", &config);
        assert!(response.success);

        let data = response.data.unwrap();
        assert!(data.optimized_totals.carbs > 150.0);
        assert!(data.overages.carbs < 0.0);
        assert!(data.accuracy.carbs < 100.0);
    }

    #[test]
    fn test_against_sqlite_sources() {
        let database = Database::in_memory().unwrap();
        database
            .with_conn(|conn| crate::db::migrations::run_migrations(conn))
            .unwrap();

        let doc: PlanDocument = serde_json::from_str(
            r#"{
                "name": "Oat breakfast",
                "ingredients": [{"name": "Oats", "unit": "g", "calories": 4, "carbs": 1, "minimumAmount": 20}],
                "days": [{"dayNumber": 1, "meals": [
                    {"mealType": "breakfast", "items": [{"ingredient": "Oats", "amount": 100}]}
                ]}]
            }"#,
        )
        .unwrap();
        let plan_id = database
            .with_conn_mut(|conn| MealPlan::import(conn, &doc))
            .unwrap();
        database
            .with_conn(|conn| {
                UserProfile::set(
                    conn,
                    "u-2",
                    None,
                    &UserTargets {
                        target_calories: 400.0,
                        target_protein: 0.0,
                        target_carbs: 60.0,
                        target_fat: 0.0,
                    },
                )
            })
            .unwrap();

        let s = SqliteSources::new(database);
        let response = optimize_plan(&s, &s, plan_id, "u-2", &OptimizerConfig::default());
        assert!(response.success);
        let data = response.data.unwrap();
        assert!((data.optimized_totals.carbs - 60.0).abs() < 1e-9);
    }
}
