//! Meal plan model
//!
//! A template plan: ordered days, each with ordered meals, each with ordered
//! ingredient lines. Loading joins every line with its nutrition facts.

use std::collections::HashSet;

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::{Ingredient, IngredientCreate, MacroTotals};

/// Meal type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Unspecified,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Unspecified => "unspecified",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" => MealType::Snack,
            _ => MealType::Unspecified,
        }
    }
}

/// Identity of an ingredient line; fixed for the lifetime of a plan
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineIdentity {
    pub day: i64,
    pub meal_type: MealType,
    pub ingredient_name: String,
}

/// One ingredient in one meal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientLine {
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub unit: String,
    pub amount: f64,
    /// Nutrition per 1 unit
    pub per_unit: MacroTotals,
    /// Absolute floor; `None` means the line is never reduced
    pub minimum_amount: Option<f64>,
}

impl IngredientLine {
    /// Nutrition contributed at the current amount
    pub fn contribution(&self) -> MacroTotals {
        self.per_unit.scale(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMeal {
    pub meal_type: MealType,
    pub name: Option<String>,
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    pub day_number: i64,
    pub label: Option<String>,
    pub meals: Vec<PlanMeal>,
}

/// A full meal plan snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: i64,
    pub name: String,
    pub reference_calories: Option<f64>,
    pub days: Vec<PlanDay>,
}

/// Plan summary for listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: i64,
    pub name: String,
    pub reference_calories: Option<f64>,
    pub day_count: i64,
    pub ingredient_count: i64,
    pub base_calories: f64,
}

// ============================================================================
// Import document
// ============================================================================

/// A plan as authored in a JSON file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    pub name: String,
    pub reference_calories: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientCreate>,
    pub days: Vec<DayDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDocument {
    pub day_number: i64,
    pub label: Option<String>,
    pub meals: Vec<MealDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealDocument {
    pub meal_type: MealType,
    pub name: Option<String>,
    pub items: Vec<ItemDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    /// Ingredient name, matched against the nutrition fact table
    pub ingredient: String,
    pub amount: f64,
    /// Overrides the ingredient's default minimum for this line
    pub minimum_amount: Option<f64>,
}

impl MealPlan {
    /// Iterate lines in day-major, meal-minor, ingredient-innermost order
    pub fn lines(&self) -> impl Iterator<Item = (&PlanDay, &PlanMeal, &IngredientLine)> {
        self.days.iter().flat_map(|day| {
            day.meals.iter().flat_map(move |meal| {
                meal.ingredients.iter().map(move |line| (day, meal, line))
            })
        })
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// Identities of every line, in traversal order
    pub fn identities(&self) -> Vec<LineIdentity> {
        self.lines()
            .map(|(day, meal, line)| LineIdentity {
                day: day.day_number,
                meal_type: meal.meal_type,
                ingredient_name: line.ingredient_name.clone(),
            })
            .collect()
    }

    /// Check the invariants the optimizer relies on
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (day, meal, line) in self.lines() {
            let identity = LineIdentity {
                day: day.day_number,
                meal_type: meal.meal_type,
                ingredient_name: line.ingredient_name.clone(),
            };
            let label = format!(
                "'{}' (day {}, {})",
                line.ingredient_name,
                day.day_number,
                meal.meal_type.as_str()
            );
            if !seen.insert(identity) {
                return Err(format!("duplicate ingredient line {}", label));
            }
            if !line.amount.is_finite() || line.amount < 0.0 {
                return Err(format!("ingredient line {} has invalid amount {}", label, line.amount));
            }
            if let Some(min) = line.minimum_amount {
                if !min.is_finite() || min < 0.0 {
                    return Err(format!("ingredient line {} has invalid minimum {}", label, min));
                }
            }
            if !line.per_unit.is_finite() || !line.per_unit.is_non_negative() {
                return Err(format!("ingredient line {} has negative or non-finite nutrition", label));
            }
        }
        Ok(())
    }

    fn line_from_row(row: &Row) -> rusqlite::Result<IngredientLine> {
        Ok(IngredientLine {
            ingredient_id: row.get("ingredient_id")?,
            ingredient_name: row.get("name")?,
            unit: row.get("unit")?,
            amount: row.get("amount")?,
            per_unit: MacroTotals {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            minimum_amount: row.get("minimum_amount")?,
        })
    }

    /// Load a plan with its full structure
    pub fn load(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let header = conn.query_row(
            "SELECT id, name, reference_calories FROM meal_plans WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>("id")?,
                    row.get::<_, String>("name")?,
                    row.get::<_, Option<f64>>("reference_calories")?,
                ))
            },
        );
        let (id, name, reference_calories) = match header {
            Ok(h) => h,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut day_stmt = conn.prepare(
            "SELECT id, day_number, label FROM plan_days WHERE plan_id = ?1 ORDER BY day_number",
        )?;
        let day_rows = day_stmt
            .query_map([id], |row| {
                Ok((
                    row.get::<_, i64>("id")?,
                    row.get::<_, i64>("day_number")?,
                    row.get::<_, Option<String>>("label")?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut meal_stmt = conn.prepare(
            "SELECT id, meal_type, name FROM plan_meals WHERE day_id = ?1 ORDER BY position, id",
        )?;
        let mut line_stmt = conn.prepare(
            r#"
            SELECT pi.ingredient_id, i.name, i.unit, pi.amount,
                   i.calories, i.protein, i.carbs, i.fat,
                   COALESCE(pi.minimum_amount, i.minimum_amount) AS minimum_amount
            FROM plan_ingredients pi
            JOIN ingredients i ON i.id = pi.ingredient_id
            WHERE pi.meal_id = ?1
            ORDER BY pi.position, pi.id
            "#,
        )?;

        let mut days = Vec::with_capacity(day_rows.len());
        for (day_id, day_number, label) in day_rows {
            let meal_rows = meal_stmt
                .query_map([day_id], |row| {
                    Ok((
                        row.get::<_, i64>("id")?,
                        row.get::<_, String>("meal_type")?,
                        row.get::<_, Option<String>>("name")?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut meals = Vec::with_capacity(meal_rows.len());
            for (meal_id, meal_type, meal_name) in meal_rows {
                let ingredients = line_stmt
                    .query_map([meal_id], Self::line_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                meals.push(PlanMeal {
                    meal_type: MealType::from_str(&meal_type),
                    name: meal_name,
                    ingredients,
                });
            }

            days.push(PlanDay { day_number, label, meals });
        }

        Ok(Some(Self { id, name, reference_calories, days }))
    }

    /// List plans with structure counts and unscaled calories
    pub fn list(conn: &Connection) -> DbResult<Vec<PlanSummary>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT p.id, p.name, p.reference_calories,
                (SELECT COUNT(*) FROM plan_days d WHERE d.plan_id = p.id) AS day_count,
                (SELECT COUNT(*)
                   FROM plan_ingredients pi
                   JOIN plan_meals m ON m.id = pi.meal_id
                   JOIN plan_days d ON d.id = m.day_id
                  WHERE d.plan_id = p.id) AS ingredient_count,
                (SELECT COALESCE(SUM(pi.amount * i.calories), 0)
                   FROM plan_ingredients pi
                   JOIN ingredients i ON i.id = pi.ingredient_id
                   JOIN plan_meals m ON m.id = pi.meal_id
                   JOIN plan_days d ON d.id = m.day_id
                  WHERE d.plan_id = p.id) AS base_calories
            FROM meal_plans p
            ORDER BY p.id
            "#,
        )?;

        let plans = stmt
            .query_map([], |row| {
                Ok(PlanSummary {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    reference_calories: row.get("reference_calories")?,
                    day_count: row.get("day_count")?,
                    ingredient_count: row.get("ingredient_count")?,
                    base_calories: row.get("base_calories")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM meal_plans", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert a plan document in one transaction, returning the new plan id
    pub fn import(conn: &mut Connection, doc: &PlanDocument) -> DbResult<i64> {
        if doc.days.is_empty() {
            return Err(DbError::InvalidData(format!("plan '{}' has no days", doc.name)));
        }

        let tx = conn.transaction()?;

        for ingredient in &doc.ingredients {
            Ingredient::upsert(&tx, ingredient)?;
        }

        tx.execute(
            "INSERT INTO meal_plans (name, reference_calories, notes) VALUES (?1, ?2, ?3)",
            params![doc.name, doc.reference_calories, doc.notes],
        )?;
        let plan_id = tx.last_insert_rowid();

        for day in &doc.days {
            tx.execute(
                "INSERT INTO plan_days (plan_id, day_number, label) VALUES (?1, ?2, ?3)",
                params![plan_id, day.day_number, day.label],
            )?;
            let day_id = tx.last_insert_rowid();

            for (meal_pos, meal) in day.meals.iter().enumerate() {
                tx.execute(
                    "INSERT INTO plan_meals (day_id, meal_type, position, name) VALUES (?1, ?2, ?3, ?4)",
                    params![day_id, meal.meal_type.as_str(), meal_pos as i64, meal.name],
                )?;
                let meal_id = tx.last_insert_rowid();

                for (item_pos, item) in meal.items.iter().enumerate() {
                    let ingredient = Ingredient::get_by_name(&tx, item.ingredient.trim())?
                        .ok_or_else(|| {
                            DbError::InvalidData(format!(
                                "unknown ingredient '{}' on day {}",
                                item.ingredient, day.day_number
                            ))
                        })?;
                    if !item.amount.is_finite() || item.amount < 0.0 {
                        return Err(DbError::InvalidData(format!(
                            "ingredient '{}' on day {} has invalid amount {}",
                            item.ingredient, day.day_number, item.amount
                        )));
                    }
                    tx.execute(
                        r#"
                        INSERT INTO plan_ingredients (meal_id, ingredient_id, position, amount, minimum_amount)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                        "#,
                        params![meal_id, ingredient.id, item_pos as i64, item.amount, item.minimum_amount],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(plan_id)
    }
}
