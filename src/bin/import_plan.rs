//! Utility to import a template meal plan from a JSON document
//!
//! Usage:
//! ```bash
//! cargo run --bin import_plan -- demos/scenario_a_plan.json
//! ```

use std::path::PathBuf;

use clap::Parser;

use nutriscale::config;
use nutriscale::models::PlanDocument;
use nutriscale::tools::plans;

#[derive(Parser)]
#[command(name = "import_plan", about = "Import a template meal plan into the NutriScale database")]
struct ImportArgs {
    /// Path to the plan JSON document
    file: PathBuf,

    /// Database path (defaults to NUTRISCALE_DATABASE_PATH or data/nutriscale.db)
    #[arg(long)]
    database: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ImportArgs::parse();

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

    let raw = std::fs::read_to_string(&args.file)?;
    let doc: PlanDocument = serde_json::from_str(&raw)?;

    let imported = plans::import_plan(&database, &doc)?;
    println!("Plan imported:");
    println!("  ID: {}", imported.id);
    println!("  Name: {}", imported.name);
    println!("  Days: {}", imported.day_count);
    println!("  Ingredient lines: {}", imported.ingredient_count);
    println!(
        "  Base totals: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat",
        imported.base_totals.calories,
        imported.base_totals.protein,
        imported.base_totals.carbs,
        imported.base_totals.fat
    );

    Ok(())
}
