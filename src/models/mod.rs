//! Data models
//!
//! Rust structs representing database entities.

mod ingredient;
mod meal_plan;
mod nutrition;
mod user_profile;

pub use ingredient::{Ingredient, IngredientCreate};
pub use meal_plan::{
    DayDocument, IngredientLine, ItemDocument, LineIdentity, MealDocument, MealPlan, MealType,
    PlanDay, PlanDocument, PlanMeal, PlanSummary,
};
pub use nutrition::{Macro, MacroTotals, UserTargets};
pub use user_profile::UserProfile;
