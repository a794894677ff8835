use time::Date;

use super::model::{DietPlan, Meal};
use crate::ai::validator::ValidatedPlan;
use crate::nutrition::NutritionTargets;

/// Which path produced the meals.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanSource {
    Generated(ValidatedPlan),
    RuleBased(Vec<Meal>),
}

/// Pairs a path's meals with the targets they were built for. Generated
/// plans carry the targets the model returned (already backfilled).
pub fn assemble(date: Date, computed: NutritionTargets, source: PlanSource) -> DietPlan {
    match source {
        PlanSource::Generated(plan) => DietPlan {
            date,
            meals: plan.meals,
            targets: plan.targets,
            generated_by_ai: true,
        },
        PlanSource::RuleBased(meals) => DietPlan {
            date,
            meals,
            targets: computed,
            generated_by_ai: false,
        },
    }
}
