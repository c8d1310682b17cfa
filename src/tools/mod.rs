//! NutriScale Tools module
//!
//! Tool implementations behind the MCP server.

pub mod optimize;
pub mod plans;
pub mod status;
