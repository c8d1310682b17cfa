//! NutriScale MCP Server Implementation
//!
//! Implements the MCP server with all NutriScale tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::OptimizerConfig;
use crate::db::{Database, SqliteSources};
use crate::tools::optimize;
use crate::tools::plans;
use crate::tools::status::StatusTracker;

/// NutriScale MCP Service
#[derive(Clone)]
pub struct NutriScaleService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    config: OptimizerConfig,
    tool_router: ToolRouter<NutriScaleService>,
}

impl NutriScaleService {
    pub fn new(database_path: PathBuf, database: Database, config: OptimizerConfig) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            config,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetPlanParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetUserTargetsParams {
    pub user_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OptimizePlanParams {
    /// Template plan to adapt
    pub plan_id: i64,
    /// User whose stored targets drive the adaptation
    pub user_id: String,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl NutriScaleService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriScale service including build info, database status, optimizer settings, and process information")]
    async fn service_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database, &self.config);
        to_json(&status)
    }

    #[tool(description = "Get instructions for adapting a meal plan to a user's targets and for reading the optimization result. Call this before the first optimize_plan.")]
    fn optimizer_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::OPTIMIZER_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(OPTIMIZER_INSTRUCTIONS)]))
    }

    // --- Plans ---

    #[tool(description = "List template meal plans with their base calories")]
    fn list_plans(&self) -> Result<CallToolResult, McpError> {
        let result = plans::list_plans(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a template meal plan with every ingredient line and per-day base totals")]
    fn get_plan(&self, Parameters(p): Parameters<GetPlanParams>) -> Result<CallToolResult, McpError> {
        let result = plans::get_plan(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(plan) => to_json(&plan),
            None => Ok(CallToolResult::success(vec![Content::text(format!("Plan {} not found", p.id))])),
        }
    }

    // --- Users ---

    #[tool(description = "Get a user's stored calorie, protein, carbs, and fat targets")]
    fn get_user_targets(&self, Parameters(p): Parameters<GetUserTargetsParams>) -> Result<CallToolResult, McpError> {
        let result = plans::get_user_targets(&self.database, &p.user_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(profile) => to_json(&profile),
            None => Ok(CallToolResult::success(vec![Content::text(format!("No targets stored for user {}", p.user_id))])),
        }
    }

    // --- Optimization ---

    #[tool(description = "Scale a template meal plan to a user's calorie target, then trim reducible ingredients until protein, carbs, and fat are within tolerance. Always returns a JSON body with success, data or error, and debug.")]
    fn optimize_plan(&self, Parameters(p): Parameters<OptimizePlanParams>) -> Result<CallToolResult, McpError> {
        let sources = SqliteSources::new(self.database.clone());
        let response = optimize::optimize_plan(&sources, &sources, p.plan_id, &p.user_id, &self.config);
        to_json(&response)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriScaleService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutriscale".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriScale Meal Plan Optimizer".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriScale - adapts template meal plans to personal calorie and macro targets. \
                 Call optimizer_instructions first. \
                 Plans: list_plans, get_plan. Users: get_user_targets. \
                 Optimization: optimize_plan(plan_id, user_id) scales the plan, trims reducible ingredients, \
                 and reports accuracy plus a step-by-step trace. \
                 Status: service_status."
                    .into(),
            ),
        }
    }
}
