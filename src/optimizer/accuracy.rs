//! Per-macro accuracy against the user's targets

use serde::Serialize;

use crate::models::{Macro, MacroTotals};

/// Accuracy percentages, each in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroAccuracy {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroAccuracy {
    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein,
            Macro::Carbs => self.carbs,
            Macro::Fat => self.fat,
        }
    }
}

/// `100 - |actual - target| / target * 100`, clamped to `[0, 100]`.
///
/// A zero target scores 100 only when the actual value is zero as well.
pub fn macro_accuracy(actual: f64, target: f64) -> f64 {
    if target == 0.0 {
        return if actual == 0.0 { 100.0 } else { 0.0 };
    }
    let score = 100.0 - ((actual - target).abs() / target.abs()) * 100.0;
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

pub fn evaluate(actual: &MacroTotals, targets: &MacroTotals) -> MacroAccuracy {
    MacroAccuracy {
        calories: macro_accuracy(actual.calories, targets.calories),
        protein: macro_accuracy(actual.protein, targets.protein),
        carbs: macro_accuracy(actual.carbs, targets.carbs),
        fat: macro_accuracy(actual.fat, targets.fat),
    }
}
