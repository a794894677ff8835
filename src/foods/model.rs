use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::profiles::model::DietaryPreference;

/// Catalog entry; nutrients are per 100 g (or 100 ml for drinks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    #[sqlx(rename = "meal_types")]
    pub meal_type: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_serving")]
    pub typical_serving: f64,
    #[serde(default = "default_serving_unit")]
    pub serving_unit: String,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
    #[serde(default)]
    pub is_dairy_free: bool,
    #[serde(default)]
    pub allergens: Vec<String>,
}

pub(crate) fn default_category() -> String {
    "other".to_string()
}

pub(crate) fn default_serving() -> f64 {
    100.0
}

pub(crate) fn default_serving_unit() -> String {
    "grams".to_string()
}

impl FoodItem {
    pub fn tagged_for(&self, tag: &str) -> bool {
        self.meal_type.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn is_snack_like(&self) -> bool {
        matches!(self.category.as_str(), "snack" | "dessert")
    }

    pub fn contains_any_allergen(&self, allergens: &[String]) -> bool {
        self.allergens
            .iter()
            .any(|a| allergens.iter().any(|u| a.eq_ignore_ascii_case(u)))
    }
}

/// Dietary flag columns a preference can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietaryFlag {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
}

impl DietaryFlag {
    pub fn column(&self) -> &'static str {
        match self {
            DietaryFlag::Vegetarian => "is_vegetarian",
            DietaryFlag::Vegan => "is_vegan",
            DietaryFlag::GlutenFree => "is_gluten_free",
            DietaryFlag::DairyFree => "is_dairy_free",
        }
    }

    #[cfg(test)]
    pub fn matches(&self, food: &FoodItem) -> bool {
        match self {
            DietaryFlag::Vegetarian => food.is_vegetarian,
            DietaryFlag::Vegan => food.is_vegan,
            DietaryFlag::GlutenFree => food.is_gluten_free,
            DietaryFlag::DairyFree => food.is_dairy_free,
        }
    }
}

impl TryFrom<DietaryPreference> for DietaryFlag {
    type Error = DietaryPreference;

    fn try_from(pref: DietaryPreference) -> Result<Self, Self::Error> {
        match pref {
            DietaryPreference::Vegetarian => Ok(DietaryFlag::Vegetarian),
            DietaryPreference::Vegan => Ok(DietaryFlag::Vegan),
            DietaryPreference::GlutenFree => Ok(DietaryFlag::GlutenFree),
            DietaryPreference::DairyFree => Ok(DietaryFlag::DairyFree),
            other => Err(other),
        }
    }
}

/// Catalog query. `any_flags` is OR-ed: a food matching one flag qualifies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodFilter {
    pub meal_type: Option<String>,
    pub category: Option<String>,
    pub any_flags: Vec<DietaryFlag>,
    pub limit: Option<i64>,
}

impl FoodFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn any_of(flags: Vec<DietaryFlag>) -> Self {
        Self {
            any_flags: flags,
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[cfg(test)]
    pub fn matches(&self, food: &FoodItem) -> bool {
        if let Some(tag) = &self.meal_type {
            if !food.tagged_for(tag) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !food.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        self.any_flags.is_empty() || self.any_flags.iter().any(|f| f.matches(food))
    }
}
