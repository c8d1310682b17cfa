//! Utility to set a user's calorie and macro targets
//!
//! Usage:
//! ```bash
//! cargo run --bin set_user_targets -- alex 2400 200 240 80 --name "Alex"
//! ```

use std::path::PathBuf;

use clap::Parser;

use nutriscale::config;
use nutriscale::models::UserTargets;
use nutriscale::tools::plans;

#[derive(Parser)]
#[command(name = "set_user_targets", about = "Create or update a user's daily targets")]
struct TargetArgs {
    user_id: String,
    /// Daily calories (kcal)
    calories: f64,
    /// Daily protein (g)
    protein: f64,
    /// Daily carbohydrates (g)
    carbs: f64,
    /// Daily fat (g)
    fat: f64,

    #[arg(long)]
    name: Option<String>,

    /// Database path (defaults to NUTRISCALE_DATABASE_PATH or data/nutriscale.db)
    #[arg(long)]
    database: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = TargetArgs::parse();

    let db_path = args.database.unwrap_or_else(config::database_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    println!("Database path: {}", db_path.display());

    let database = nutriscale::db::Database::new(&db_path)?;
    database.with_conn(|conn| {
        nutriscale::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let targets = UserTargets {
        target_calories: args.calories,
        target_protein: args.protein,
        target_carbs: args.carbs,
        target_fat: args.fat,
    };

    let profile = plans::set_user_targets(&database, &args.user_id, args.name.as_deref(), &targets)?;
    println!("Targets set:");
    println!("  User: {}", profile.user_id);
    if let Some(name) = &profile.display_name {
        println!("  Name: {}", name);
    }
    println!("  Calories: {}", profile.targets.target_calories);
    println!("  Protein: {}", profile.targets.target_protein);
    println!("  Carbs: {}", profile.targets.target_carbs);
    println!("  Fat: {}", profile.targets.target_fat);
    println!("  Updated: {}", profile.updated_at);

    Ok(())
}
