pub mod targets;

pub use targets::{compute_targets, NutritionTargets};
