//! Structural checks and light repair of model output.
//!
//! A response is accepted when at least one meal of a known type carries a
//! named item. Everything else that is fixable gets fixed: meal types are
//! normalized, unknown or malformed meals and items are dropped, negative numbers
//! clamp to zero and meal totals are recomputed when they disagree with
//! their items.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::PlanError;
use crate::foods::model::{default_category, default_serving, default_serving_unit, FoodItem};
use crate::nutrition::NutritionTargets;
use crate::plans::model::{Meal, MealItem, MealType};

const TOTAL_TOLERANCE_KCAL: f64 = 1.0;

/// A model-produced plan that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPlan {
    pub meals: Vec<Meal>,
    pub targets: NutritionTargets,
}

/// Numbers arrive as JSON numbers or, from some models, as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Num {
    Number(f64),
    Text(String),
}

impl Num {
    fn value(&self) -> Option<f64> {
        let v = match self {
            Num::Number(n) => Some(*n),
            Num::Text(s) => s.trim().parse::<f64>().ok(),
        };
        v.filter(|v| v.is_finite())
    }
}

/// A tag list, or a single bare tag.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum Tags {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Tags {
    fn normalized(self) -> Vec<String> {
        let values = match self {
            Tags::None => Vec::new(),
            Tags::One(v) => vec![v],
            Tags::Many(vs) => vs,
        };
        values
            .into_iter()
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// Decodes one entry of a list on its own so a malformed entry only costs
/// itself.
fn entry<T: DeserializeOwned>(value: Value, kind: &'static str) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(kind, error = %e, "dropping malformed entry");
            None
        }
    }
}

fn non_negative(n: &Option<Num>) -> f64 {
    n.as_ref().and_then(Num::value).unwrap_or(0.0).max(0.0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanPayload {
    meals: Option<Vec<Value>>,
    daily_calories: Option<Num>,
    daily_protein: Option<Num>,
    daily_carbs: Option<Num>,
    daily_fats: Option<Num>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MealPayload {
    meal_type: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
    total_calories: Option<Num>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemPayload {
    name: Option<String>,
    quantity: Option<Num>,
    unit: Option<String>,
    calories: Option<Num>,
    protein: Option<Num>,
    carbs: Option<Num>,
    fats: Option<Num>,
}

impl ItemPayload {
    fn repair(self) -> Option<MealItem> {
        let name = self.name?.trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(MealItem {
            name,
            quantity: non_negative(&self.quantity),
            unit: self
                .unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(default_serving_unit),
            calories: non_negative(&self.calories),
            protein: non_negative(&self.protein),
            carbs: non_negative(&self.carbs),
            fats: non_negative(&self.fats),
        })
    }
}

impl MealPayload {
    fn repair(self) -> Option<Meal> {
        let raw_type = self.meal_type.unwrap_or_default();
        let meal_type = match raw_type.parse::<MealType>() {
            Ok(t) => t,
            Err(_) => {
                warn!(meal_type = %raw_type, "dropping meal with unknown type");
                return None;
            }
        };

        let items: Vec<MealItem> = self
            .items
            .into_iter()
            .filter_map(|v| entry::<ItemPayload>(v, "meal item"))
            .filter_map(ItemPayload::repair)
            .collect();
        if items.is_empty() {
            return None;
        }

        let item_sum: f64 = items.iter().map(|i| i.calories).sum();
        let total_calories = match self.total_calories.as_ref().and_then(Num::value) {
            Some(t) if (t - item_sum).abs() <= TOTAL_TOLERANCE_KCAL => t,
            _ => item_sum,
        };

        Some(Meal {
            meal_type,
            items,
            total_calories,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Parses and repairs a plan response. Targets the model omitted or gave
/// as non-positive fall back to `computed`.
pub fn validate_plan(raw: &str, computed: &NutritionTargets) -> Result<ValidatedPlan, PlanError> {
    let payload: PlanPayload = serde_json::from_str(raw.trim())
        .map_err(|e| PlanError::invalid_output(format!("response is not a plan object: {e}")))?;

    let meals = payload.meals.unwrap_or_default();
    if meals.is_empty() {
        return Err(PlanError::invalid_output("response contains no meals"));
    }

    let meals: Vec<Meal> = meals
        .into_iter()
        .filter_map(|v| entry::<MealPayload>(v, "meal"))
        .filter_map(MealPayload::repair)
        .collect();
    if meals.is_empty() {
        return Err(PlanError::invalid_output("no meal has a known type and a named item"));
    }

    let pick = |n: &Option<Num>, fallback: u32| -> u32 {
        match n.as_ref().and_then(Num::value) {
            Some(v) if v >= 0.5 => v.round() as u32,
            _ => fallback,
        }
    };

    Ok(ValidatedPlan {
        meals,
        targets: NutritionTargets {
            daily_calories: pick(&payload.daily_calories, computed.daily_calories),
            daily_protein: pick(&payload.daily_protein, computed.daily_protein),
            daily_carbs: pick(&payload.daily_carbs, computed.daily_carbs),
            daily_fats: pick(&payload.daily_fats, computed.daily_fats),
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FoodListPayload {
    Wrapped { foods: Vec<Value> },
    Bare(Vec<Value>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodPayload {
    name: Option<String>,
    calories: Option<Num>,
    protein: Option<Num>,
    carbs: Option<Num>,
    fats: Option<Num>,
    #[serde(default)]
    meal_type: Tags,
    category: Option<String>,
    typical_serving: Option<Num>,
    serving_unit: Option<String>,
    #[serde(default)]
    is_vegetarian: bool,
    #[serde(default)]
    is_vegan: bool,
    #[serde(default)]
    is_gluten_free: bool,
    #[serde(default)]
    is_dairy_free: bool,
    #[serde(default)]
    allergens: Tags,
}

impl FoodPayload {
    fn repair(self) -> Option<FoodItem> {
        let name = self.name?.trim().to_string();
        if name.is_empty() {
            return None;
        }
        let calories = self.calories.as_ref().and_then(Num::value)?.max(0.0);
        Some(FoodItem {
            name,
            calories,
            protein: non_negative(&self.protein),
            carbs: non_negative(&self.carbs),
            fats: non_negative(&self.fats),
            meal_type: self.meal_type.normalized(),
            category: self
                .category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(default_category),
            typical_serving: self
                .typical_serving
                .as_ref()
                .and_then(Num::value)
                .filter(|s| *s > 0.0)
                .unwrap_or_else(default_serving),
            serving_unit: self
                .serving_unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(default_serving_unit),
            // a vegan food is vegetarian whatever the model claimed
            is_vegetarian: self.is_vegetarian || self.is_vegan,
            is_vegan: self.is_vegan,
            is_gluten_free: self.is_gluten_free,
            is_dairy_free: self.is_dairy_free,
            allergens: self.allergens.normalized(),
        })
    }
}

/// Parses a generated food list. Entries without a name or calorie value
/// are dropped; later duplicates of a name (case-insensitive) are dropped.
pub fn parse_food_list(raw: &str) -> Result<Vec<FoodItem>, PlanError> {
    let payload: FoodListPayload = serde_json::from_str(raw.trim())
        .map_err(|e| PlanError::invalid_output(format!("response is not a food list: {e}")))?;
    let entries = match payload {
        FoodListPayload::Wrapped { foods } | FoodListPayload::Bare(foods) => foods,
    };

    let mut seen = HashSet::new();
    let foods: Vec<FoodItem> = entries
        .into_iter()
        .filter_map(|v| entry::<FoodPayload>(v, "food"))
        .filter_map(FoodPayload::repair)
        .filter(|f| seen.insert(f.name.to_lowercase()))
        .collect();

    if foods.is_empty() {
        return Err(PlanError::invalid_output("food list is empty"));
    }
    Ok(foods)
}
