//! Ingredient model
//!
//! The nutrition fact table: per-unit macros and the default minimum amount.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::MacroTotals;

/// An ingredient with nutrition per 1 unit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub unit: String,
    pub per_unit: MacroTotals,
    pub minimum_amount: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating or refreshing an ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCreate {
    pub name: String,
    pub unit: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    pub minimum_amount: Option<f64>,
    pub notes: Option<String>,
}

impl IngredientCreate {
    fn validate(&self) -> DbResult<()> {
        if self.name.trim().is_empty() {
            return Err(DbError::InvalidData("ingredient name is empty".to_string()));
        }
        let per_unit = MacroTotals::new(self.calories, self.protein, self.carbs, self.fat);
        if !per_unit.is_finite() || !per_unit.is_non_negative() {
            return Err(DbError::InvalidData(format!(
                "ingredient '{}' has negative or non-finite nutrition",
                self.name
            )));
        }
        if let Some(min) = self.minimum_amount {
            if !min.is_finite() || min < 0.0 {
                return Err(DbError::InvalidData(format!(
                    "ingredient '{}' has an invalid minimum amount {}",
                    self.name, min
                )));
            }
        }
        Ok(())
    }
}

impl Ingredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            unit: row.get("unit")?,
            per_unit: MacroTotals {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            minimum_amount: row.get("minimum_amount")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert an ingredient, or refresh the existing row with the same name
    pub fn upsert(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        data.validate()?;

        conn.execute(
            r#"
            INSERT INTO ingredients (name, unit, calories, protein, carbs, fat, minimum_amount, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(name) DO UPDATE SET
                unit = excluded.unit,
                calories = excluded.calories,
                protein = excluded.protein,
                carbs = excluded.carbs,
                fat = excluded.fat,
                minimum_amount = excluded.minimum_amount,
                notes = excluded.notes,
                updated_at = datetime('now')
            "#,
            params![
                data.name.trim(),
                data.unit.trim(),
                data.calories,
                data.protein,
                data.carbs,
                data.fat,
                data.minimum_amount,
                data.notes,
            ],
        )?;

        Self::get_by_name(conn, data.name.trim())?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(ingredient) => Ok(Some(ingredient)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE name = ?1")?;

        match stmt.query_row([name], Self::from_row) {
            Ok(ingredient) => Ok(Some(ingredient)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ingredients", [], |row| row.get(0))?;
        Ok(count)
    }
}
