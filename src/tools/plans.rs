//! Plan and profile MCP Tools
//!
//! Read access to stored plans and targets, plus the import and upsert
//! helpers used by the seeding binaries.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    MacroTotals, MealPlan, PlanDocument, PlanMeal, PlanSummary, UserProfile, UserTargets,
};
use crate::optimizer::{classify, day_totals, plan_totals};

/// Response for list_plans
#[derive(Debug, Serialize)]
pub struct ListPlansResponse {
    pub plans: Vec<PlanSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDetail {
    pub day_number: i64,
    pub label: Option<String>,
    pub meals: Vec<PlanMeal>,
    pub totals: MacroTotals,
}

/// Full plan with per-day and overall base totals
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetail {
    pub id: i64,
    pub name: String,
    pub reference_calories: Option<f64>,
    pub days: Vec<DayDetail>,
    pub totals: MacroTotals,
    pub ingredient_count: usize,
    pub reducible_count: usize,
}

/// Response for import_plan
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPlanResponse {
    pub id: i64,
    pub name: String,
    pub day_count: usize,
    pub ingredient_count: usize,
    pub base_totals: MacroTotals,
}

pub fn list_plans(db: &Database) -> Result<ListPlansResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plans = MealPlan::list(&conn).map_err(|e| format!("Failed to list plans: {}", e))?;

    Ok(ListPlansResponse {
        total: plans.len(),
        plans,
    })
}

pub fn get_plan(db: &Database, id: i64) -> Result<Option<PlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let plan = MealPlan::load(&conn, id).map_err(|e| format!("Failed to load plan: {}", e))?;

    Ok(plan.map(|plan| {
        let totals = plan_totals(&plan);
        let ingredient_count = plan.line_count();
        let reducible_count = classify(&plan).candidates.len();
        PlanDetail {
            id: plan.id,
            name: plan.name,
            reference_calories: plan.reference_calories,
            days: plan
                .days
                .into_iter()
                .map(|day| DayDetail {
                    totals: day_totals(&day),
                    day_number: day.day_number,
                    label: day.label,
                    meals: day.meals,
                })
                .collect(),
            totals,
            ingredient_count,
            reducible_count,
        }
    }))
}

/// Insert a plan document; ingredients are upserted by name
pub fn import_plan(db: &Database, doc: &PlanDocument) -> Result<ImportPlanResponse, String> {
    let id = db
        .with_conn_mut(|conn| MealPlan::import(conn, doc))
        .map_err(|e| format!("Failed to import plan: {}", e))?;

    let plan = db
        .with_conn(|conn| MealPlan::load(conn, id))
        .map_err(|e| format!("Failed to reload plan: {}", e))?
        .ok_or_else(|| format!("Plan {} vanished after import", id))?;

    tracing::info!("Imported plan {} ('{}')", plan.id, plan.name);

    Ok(ImportPlanResponse {
        id: plan.id,
        day_count: plan.days.len(),
        ingredient_count: plan.line_count(),
        base_totals: plan_totals(&plan),
        name: plan.name,
    })
}

pub fn get_user_targets(db: &Database, user_id: &str) -> Result<Option<UserProfile>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    UserProfile::get(&conn, user_id).map_err(|e| format!("Failed to get profile: {}", e))
}

pub fn set_user_targets(
    db: &Database,
    user_id: &str,
    display_name: Option<&str>,
    targets: &UserTargets,
) -> Result<UserProfile, String> {
    if user_id.trim().is_empty() {
        return Err("user_id must not be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    UserProfile::set(&conn, user_id.trim(), display_name, targets)
        .map_err(|e| format!("Failed to set targets: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| crate::db::migrations::run_migrations(conn)).unwrap();
        db
    }

    fn document() -> PlanDocument {
        serde_json::from_str(
            r#"{
                "name": "High carb day",
                "referenceCalories": 900,
                "ingredients": [
                    {"name": "Bagel", "unit": "piece", "calories": 250, "protein": 10, "carbs": 48, "fat": 1.5, "minimumAmount": 1},
                    {"name": "Jam", "unit": "tbsp", "calories": 50, "carbs": 13}
                ],
                "days": [{"dayNumber": 1, "meals": [
                    {"mealType": "breakfast", "items": [
                        {"ingredient": "Bagel", "amount": 2},
                        {"ingredient": "Jam", "amount": 2}
                    ]},
                    {"mealType": "snack", "items": [{"ingredient": "Bagel", "amount": 1}]}
                ]}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_import_then_get_plan() {
        let db = database();
        let imported = import_plan(&db, &document()).unwrap();
        assert_eq!(imported.ingredient_count, 3);
        assert!((imported.base_totals.calories - 850.0).abs() < 1e-9);

        let detail = get_plan(&db, imported.id).unwrap().unwrap();
        assert_eq!(detail.days.len(), 1);
        assert_eq!(detail.reducible_count, 1);
        assert!((detail.days[0].totals.carbs - 170.0).abs() < 1e-9);
        assert_eq!(detail.totals, imported.base_totals);

        let listed = list_plans(&db).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.plans[0].name, "High carb day");
    }

    #[test]
    fn test_get_missing_plan() {
        let db = database();
        assert!(get_plan(&db, 1).unwrap().is_none());
    }

    #[test]
    fn test_set_and_get_targets() {
        let db = database();
        let targets = UserTargets {
            target_calories: 2100.0,
            target_protein: 150.0,
            target_carbs: 220.0,
            target_fat: 70.0,
        };
        set_user_targets(&db, " alex ", Some("Alex"), &targets).unwrap();

        let profile = get_user_targets(&db, "alex").unwrap().unwrap();
        assert_eq!(profile.targets, targets);
        assert!(set_user_targets(&db, "  ", None, &targets).is_err());
    }
}
