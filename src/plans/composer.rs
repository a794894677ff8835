use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::model::{Meal, MealItem, MealType};
use crate::error::PlanError;
use crate::foods::model::FoodItem;
use crate::nutrition::NutritionTargets;

/// Share of the daily calories assigned to each slot, in plan order.
pub const SLOT_SHARES: [(MealType, f64); 4] = [
    (MealType::Breakfast, 0.25),
    (MealType::Lunch, 0.35),
    (MealType::Dinner, 0.30),
    (MealType::Snack, 0.10),
];

const STOP_FILL_RATIO: f64 = 0.9;
const TOP_UP_BELOW_RATIO: f64 = 0.8;
const MAX_TOP_UP_RATIO: f64 = 0.5;
const MAX_SERVING_MULTIPLE: f64 = 2.0;
const SNACK_NOTE: &str = "Healthy snack option";

/// Where the composer's shuffles draw their randomness from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomSource {
    Entropy,
    Seeded(u64),
}

impl RandomSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or(RandomSource::Entropy, RandomSource::Seeded)
    }

    pub fn rng(&self) -> StdRng {
        match self {
            RandomSource::Entropy => StdRng::from_entropy(),
            RandomSource::Seeded(seed) => StdRng::seed_from_u64(*seed),
        }
    }
}

/// Catalog-driven fallback that builds meals without a generative backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedMealComposer;

impl RuleBasedMealComposer {
    /// Composes the four slots in order. Slots that end up empty are left
    /// out of the plan.
    ///
    /// # Errors
    ///
    /// `FoodCatalogExhausted` when `foods` is empty or every slot is empty.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        targets: &NutritionTargets,
        foods: &[FoodItem],
        rng: &mut R,
    ) -> Result<Vec<Meal>, PlanError> {
        if foods.is_empty() {
            return Err(PlanError::FoodCatalogExhausted);
        }

        let daily = f64::from(targets.daily_calories);
        let mut meals = Vec::with_capacity(SLOT_SHARES.len());
        for (slot, share) in SLOT_SHARES {
            let meal = self.compose_slot(slot, (daily * share).round(), foods, rng);
            if meal.items.is_empty() {
                warn!(slot = slot.as_str(), "no food could be placed in slot");
                continue;
            }
            meals.push(meal);
        }

        if meals.is_empty() {
            return Err(PlanError::FoodCatalogExhausted);
        }
        Ok(meals)
    }

    pub fn compose_slot<R: Rng + ?Sized>(
        &self,
        slot: MealType,
        target: f64,
        foods: &[FoodItem],
        rng: &mut R,
    ) -> Meal {
        let mut pool: Vec<&FoodItem> = foods.iter().filter(|f| fits_slot(f, slot)).collect();
        if pool.is_empty() {
            pool = foods.iter().collect();
        }
        pool.shuffle(rng);

        let max_items = if slot == MealType::Snack { 2 } else { 4 };
        let mut items = Vec::new();
        let mut total = 0.0;

        for food in pool {
            if items.len() >= max_items {
                break;
            }
            let serving = ((target - total) / food.calories * 100.0)
                .round()
                .min(food.typical_serving * MAX_SERVING_MULTIPLE);
            // 0/0 yields NaN
            if serving.is_nan() || serving <= 0.0 {
                continue;
            }

            let item = scaled_item(food, serving);
            total += item.calories;
            items.push(item);

            if total >= target * STOP_FILL_RATIO {
                break;
            }
        }

        if total < target * TOP_UP_BELOW_RATIO {
            if let Some(first) = items.first_mut() {
                top_up(first, target - total);
            }
        }

        let total_calories = items.iter().map(|i| i.calories).sum::<f64>().round();
        debug!(slot = slot.as_str(), target, total_calories, items = items.len(), "composed slot");

        Meal {
            meal_type: slot,
            items,
            total_calories,
            notes: (slot == MealType::Snack).then(|| SNACK_NOTE.to_string()),
        }
    }
}

fn fits_slot(food: &FoodItem, slot: MealType) -> bool {
    food.tagged_for(slot.as_str()) || (slot == MealType::Snack && food.is_snack_like())
}

fn scaled_item(food: &FoodItem, serving: f64) -> MealItem {
    let per = |per_100g: f64| (per_100g * serving / 100.0).round();
    MealItem {
        name: food.name.clone(),
        quantity: serving,
        unit: food.serving_unit.clone(),
        calories: per(food.calories),
        protein: per(food.protein),
        carbs: per(food.carbs),
        fats: per(food.fats),
    }
}

/// One-shot enlargement of an item, by at most half its calories.
fn top_up(item: &mut MealItem, deficit: f64) {
    if item.calories <= 0.0 {
        return;
    }
    let additional = deficit.min(item.calories * MAX_TOP_UP_RATIO);
    let multiplier = 1.0 + additional / item.calories;
    item.quantity = (item.quantity * multiplier).round();
    item.calories = (item.calories * multiplier).round();
    item.protein = (item.protein * multiplier).round();
    item.carbs = (item.carbs * multiplier).round();
    item.fats = (item.fats * multiplier).round();
}
