//! NutriScale Status Tool
//!
//! Provides runtime status information about the service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::config::OptimizerConfig;
use crate::db::Database;
use crate::models::{Ingredient, MealPlan, UserProfile};

/// Usage guide for MCP clients
pub const OPTIMIZER_INSTRUCTIONS: &str = r#"
# NutriScale Optimizer Instructions

NutriScale adapts a template meal plan to one user's calorie and macro targets.

## Workflow

1. `list_plans` - find the template plan id. Each entry shows its base calories.
2. `get_user_targets` - confirm the user has targets stored (calories, protein, carbs, fat).
3. `optimize_plan` with `plan_id` and `user_id`.

## What optimize_plan does

1. **Scale** - every ingredient amount is multiplied by
   `target calories / base plan calories`. Minimum amounts are NOT scaled.
   An amount scaled below its minimum is held at the minimum.
2. **Classify** - an ingredient line is reducible when it has a minimum amount
   and its scaled amount is above that minimum.
3. **Correct** - while a macro is over its target by more than the tolerance
   (1% of the target or 1 unit, whichever is larger), reducible lines are trimmed
   one step at a time in plan order (day, then meal, then ingredient).
4. **Report** - per-macro accuracy (0-100) and the full step trace.

## Reading the result

- `success: false` means the plan or profile was missing, or the base plan has
  no calories. `error` explains which; `debug.errorKind` names it.
- `overages` is `target - optimized`. A negative value is remaining excess.
- `optimizations` lists each reduction with before/after nutrition and an
  `impact` sentence suitable for showing to the user.
- `debug.termination`:
  - `onTarget` - every macro is within tolerance or under target.
  - `noReducibleCandidates` - nothing left to trim; residual excess remains.
  - `iterationLimitReached` - stopped at the step cap; residual excess remains.

## Limits

- Macros under target are never raised. A protein shortfall after scaling stays.
- Ingredients without a minimum amount are never trimmed.
- The plan structure (days, meals, ingredients) never changes; only amounts do.
"#;

/// Runtime status of the service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub plan_count: Option<i64>,
    pub ingredient_count: Option<i64>,
    pub profile_count: Option<i64>,

    pub optimizer: OptimizerConfig,

    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self, database: &Database, optimizer: &OptimizerConfig) -> ServiceStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        // Counts are best effort; a locked or missing database still yields a status
        let counts = database
            .with_conn(|conn| {
                Ok((
                    MealPlan::count(conn)?,
                    Ingredient::count(conn)?,
                    UserProfile::count(conn)?,
                ))
            })
            .map_err(|e| tracing::warn!("Status counts unavailable: {}", e))
            .ok();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        ServiceStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            plan_count: counts.map(|c| c.0),
            ingredient_count: counts.map(|c| c.1),
            profile_count: counts.map(|c| c.2),
            optimizer: optimizer.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
