//! Shared macro nutrient structures
//!
//! Used for per-unit nutrition facts, line contributions, plan totals and targets.

use serde::{Deserialize, Serialize};

/// The four tracked macros, in their fixed reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Macro {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Macro {
    pub const ALL: [Macro; 4] = [Macro::Calories, Macro::Protein, Macro::Carbs, Macro::Fat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Macro::Calories => "calories",
            Macro::Protein => "protein",
            Macro::Carbs => "carbs",
            Macro::Fat => "fat",
        }
    }

    /// Display unit for amounts of this macro
    pub fn unit(&self) -> &'static str {
        match self {
            Macro::Calories => "kcal",
            _ => "g",
        }
    }
}

/// Calories (kcal) plus protein, carbs and fat (grams)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self { calories, protein, carbs, fat }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein,
            Macro::Carbs => self.carbs,
            Macro::Fat => self.fat,
        }
    }

    /// Scale all values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
        }
    }

    pub fn add(&self, other: &MacroTotals) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }

    pub fn sub(&self, other: &MacroTotals) -> Self {
        Self {
            calories: self.calories - other.calories,
            protein: self.protein - other.protein,
            carbs: self.carbs - other.carbs,
            fat: self.fat - other.fat,
        }
    }

    /// Build a value by evaluating `f` for each macro
    pub fn from_fn(mut f: impl FnMut(Macro) -> f64) -> Self {
        Self {
            calories: f(Macro::Calories),
            protein: f(Macro::Protein),
            carbs: f(Macro::Carbs),
            fat: f(Macro::Fat),
        }
    }

    pub fn is_finite(&self) -> bool {
        Macro::ALL.iter().all(|m| self.get(*m).is_finite())
    }

    pub fn is_non_negative(&self) -> bool {
        Macro::ALL.iter().all(|m| self.get(*m) >= 0.0)
    }
}

impl std::ops::Add for MacroTotals {
    type Output = MacroTotals;

    fn add(self, other: MacroTotals) -> MacroTotals {
        MacroTotals::add(&self, &other)
    }
}

impl std::ops::Sub for MacroTotals {
    type Output = MacroTotals;

    fn sub(self, other: MacroTotals) -> MacroTotals {
        MacroTotals::sub(&self, &other)
    }
}

impl std::ops::Mul<f64> for MacroTotals {
    type Output = MacroTotals;

    fn mul(self, multiplier: f64) -> MacroTotals {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for MacroTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MacroTotals::zero(), |acc, n| acc + n)
    }
}

/// A user's personal macro targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTargets {
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_carbs: f64,
    pub target_fat: f64,
}

impl UserTargets {
    pub fn as_totals(&self) -> MacroTotals {
        MacroTotals::new(
            self.target_calories,
            self.target_protein,
            self.target_carbs,
            self.target_fat,
        )
    }
}
