//! Read-only collaborators consumed by the optimizer
//!
//! The optimizer never touches storage directly; it is handed a plan and a
//! profile fetched through these traits.

use crate::models::{MealPlan, UserProfile};

use super::{Database, DbResult};

/// Fetch a template plan by id
pub trait PlanSource {
    fn fetch_plan(&self, plan_id: i64) -> DbResult<Option<MealPlan>>;
}

/// Fetch a user's profile (and thereby their targets) by id
pub trait ProfileSource {
    fn fetch_profile(&self, user_id: &str) -> DbResult<Option<UserProfile>>;
}

/// Both sources backed by the SQLite pool
#[derive(Clone)]
pub struct SqliteSources {
    database: Database,
}

impl SqliteSources {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

impl PlanSource for SqliteSources {
    fn fetch_plan(&self, plan_id: i64) -> DbResult<Option<MealPlan>> {
        self.database.with_conn(|conn| MealPlan::load(conn, plan_id))
    }
}

impl ProfileSource for SqliteSources {
    fn fetch_profile(&self, user_id: &str) -> DbResult<Option<UserProfile>> {
        self.database.with_conn(|conn| UserProfile::get(conn, user_id))
    }
}
