//! Database module
//!
//! SQLite connection pool, migrations and the read-only plan/profile sources.

pub mod connection;
pub mod migrations;
pub mod sources;

pub use connection::{Database, DbError, DbResult};
pub use sources::{PlanSource, ProfileSource, SqliteSources};
