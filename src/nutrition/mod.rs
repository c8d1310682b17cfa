//! Nutrition helpers
//!
//! Unit classification shared by the optimizer's reporting.

pub mod units;

pub use units::{categorize_unit, grams_per_unit, ml_per_unit, UnitCategory};
