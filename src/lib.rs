//! NutriScale Library
//!
//! Scales template meal plans to personal calorie targets and trims
//! ingredients until the macros fit.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod optimizer;
pub mod tools;
