//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- INGREDIENTS
        -- Nutrition fact table, values per 1 unit
        -- ============================================
        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            unit TEXT NOT NULL,                  -- "g", "ml", "piece", ...

            calories REAL NOT NULL DEFAULT 0 CHECK(calories >= 0),
            protein REAL NOT NULL DEFAULT 0 CHECK(protein >= 0),
            carbs REAL NOT NULL DEFAULT 0 CHECK(carbs >= 0),
            fat REAL NOT NULL DEFAULT 0 CHECK(fat >= 0),

            -- Absolute floor; NULL means the ingredient is never trimmed
            minimum_amount REAL CHECK(minimum_amount IS NULL OR minimum_amount >= 0),

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- MEAL PLANS
        -- Template plans authored at a reference calorie level
        -- ============================================
        CREATE TABLE meal_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            reference_calories REAL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE plan_days (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plan_id INTEGER NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            day_number INTEGER NOT NULL,
            label TEXT,
            UNIQUE(plan_id, day_number)
        );

        CREATE INDEX idx_plan_days_plan ON plan_days(plan_id);

        CREATE TABLE plan_meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            day_id INTEGER NOT NULL REFERENCES plan_days(id) ON DELETE CASCADE,
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snack', 'unspecified')),
            position INTEGER NOT NULL DEFAULT 0,
            name TEXT,
            UNIQUE(day_id, meal_type)
        );

        CREATE INDEX idx_plan_meals_day ON plan_meals(day_id);

        CREATE TABLE plan_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meal_id INTEGER NOT NULL REFERENCES plan_meals(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE RESTRICT,
            position INTEGER NOT NULL DEFAULT 0,
            amount REAL NOT NULL CHECK(amount >= 0),
            -- Overrides ingredients.minimum_amount for this line when set
            minimum_amount REAL CHECK(minimum_amount IS NULL OR minimum_amount >= 0),
            UNIQUE(meal_id, ingredient_id)
        );

        CREATE INDEX idx_plan_ingredients_meal ON plan_ingredients(meal_id);
        CREATE INDEX idx_plan_ingredients_ingredient ON plan_ingredients(ingredient_id);

        -- ============================================
        -- USER PROFILES
        -- Personalized macro targets
        -- ============================================
        CREATE TABLE user_profiles (
            user_id TEXT PRIMARY KEY,
            display_name TEXT,
            target_calories REAL NOT NULL,
            target_protein REAL NOT NULL,
            target_carbs REAL NOT NULL,
            target_fat REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
