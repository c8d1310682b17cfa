//! NutriScale
//!
//! An MCP server that adapts template meal plans to personal macro targets.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutriscale::build_info;
use nutriscale::config::Config;
use nutriscale::db;
use nutriscale::mcp::NutriScaleService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutriscale=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    eprintln!("Database path: {}", config.database_path.display());

    // Ensure data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    eprintln!("Initializing database...");
    let database = db::Database::new(&config.database_path)?;

    // Run migrations
    database.with_conn(|conn| {
        if db::migrations::needs_migration(conn)? {
            tracing::info!("Applying database migrations");
        }
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    tracing::info!(
        "Optimizer: tolerance {}% / {}, step fraction {}, min step {}, max iterations {}",
        config.optimizer.tolerance_percent,
        config.optimizer.tolerance_absolute,
        config.optimizer.step_fraction,
        config.optimizer.min_step,
        config.optimizer.max_iterations
    );

    let service = NutriScaleService::new(config.database_path, database, config.optimizer);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
