//! User profile model
//!
//! Stores personalized macro targets keyed by an external user id.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use super::UserTargets;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub targets: UserTargets,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            display_name: row.get("display_name")?,
            targets: UserTargets {
                target_calories: row.get("target_calories")?,
                target_protein: row.get("target_protein")?,
                target_carbs: row.get("target_carbs")?,
                target_fat: row.get("target_fat")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get(conn: &Connection, user_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_profiles WHERE user_id = ?1")?;

        match stmt.query_row([user_id], Self::from_row) {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set or update a user's targets (upsert)
    pub fn set(
        conn: &Connection,
        user_id: &str,
        display_name: Option<&str>,
        targets: &UserTargets,
    ) -> DbResult<Self> {
        let values = targets.as_totals();
        if !values.is_finite() || !values.is_non_negative() {
            return Err(DbError::InvalidData(format!(
                "targets for '{}' must be finite and non-negative",
                user_id
            )));
        }

        conn.execute(
            r#"
            INSERT INTO user_profiles (user_id, display_name, target_calories, target_protein, target_carbs, target_fat)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = COALESCE(excluded.display_name, user_profiles.display_name),
                target_calories = excluded.target_calories,
                target_protein = excluded.target_protein,
                target_carbs = excluded.target_carbs,
                target_fat = excluded.target_fat,
                updated_at = datetime('now')
            "#,
            params![
                user_id,
                display_name,
                targets.target_calories,
                targets.target_protein,
                targets.target_carbs,
                targets.target_fat,
            ],
        )?;

        Self::get(conn, user_id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM user_profiles", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_set_keeps_display_name_when_omitted() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let targets = UserTargets {
            target_calories: 2400.0,
            target_protein: 250.0,
            target_carbs: 180.0,
            target_fat: 90.0,
        };
        UserProfile::set(&conn, "u-1", Some("Sam"), &targets).unwrap();
        let lower = UserTargets { target_calories: 2200.0, ..targets };
        let updated = UserProfile::set(&conn, "u-1", None, &lower).unwrap();

        assert_eq!(updated.display_name.as_deref(), Some("Sam"));
        assert_eq!(updated.targets.target_calories, 2200.0);
        assert_eq!(UserProfile::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_get_unknown_user() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert!(UserProfile::get(&conn, "nobody").unwrap().is_none());
    }
}
