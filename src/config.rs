//! Runtime configuration
//!
//! Everything is read from environment variables once at startup.

use std::path::PathBuf;

use serde::Serialize;

/// Tuning knobs for the greedy corrector
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerConfig {
    /// A macro is on target when its overage is within this percent of the target
    pub tolerance_percent: f64,
    /// Absolute tolerance (kcal or grams), used when it is larger than the relative one
    pub tolerance_absolute: f64,
    /// Fraction of a candidate's initial reduction potential removed per step
    pub step_fraction: f64,
    /// Smallest step in the line's own unit
    pub min_step: f64,
    pub max_iterations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            tolerance_percent: 1.0,
            tolerance_absolute: 1.0,
            step_fraction: 0.25,
            min_step: 1.0,
            max_iterations: 1000,
        }
    }
}

impl OptimizerConfig {
    /// Build from `NUTRISCALE_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tolerance_percent: env_f64("NUTRISCALE_TOLERANCE_PERCENT", defaults.tolerance_percent, |v| v >= 0.0),
            tolerance_absolute: env_f64("NUTRISCALE_TOLERANCE_ABSOLUTE", defaults.tolerance_absolute, |v| v >= 0.0),
            step_fraction: env_f64("NUTRISCALE_STEP_FRACTION", defaults.step_fraction, |v| v > 0.0 && v <= 1.0),
            min_step: env_f64("NUTRISCALE_MIN_STEP", defaults.min_step, |v| v > 0.0),
            max_iterations: env_usize("NUTRISCALE_MAX_ITERATIONS", defaults.max_iterations),
        }
    }
}

/// Process-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub optimizer: OptimizerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: database_path(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Get the database path from environment or use default
pub fn database_path() -> PathBuf {
    std::env::var("NUTRISCALE_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("nutriscale.db");
            path
        })
}

fn env_f64(key: &str, default: f64, valid: impl Fn(f64) -> bool) -> f64 {
    match std::env::var(key) {
        Ok(raw) => match parse_f64(&raw, &valid) {
            Some(v) => v,
            None => {
                tracing::warn!("Ignoring {}={:?}, using default {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(v) if v > 0 => v,
            _ => {
                tracing::warn!("Ignoring {}={:?}, using default {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_f64(raw: &str, valid: impl Fn(f64) -> bool) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && valid(*v))
}
