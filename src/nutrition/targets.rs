use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::profiles::model::{ActivityLevel, Gender, HealthGoal, Profile};

const MAX_WEIGHT_KG: f64 = 500.0;
const MAX_HEIGHT_CM: f64 = 300.0;
const MAX_AGE: u32 = 150;

const DEFAULT_ACTIVITY_FACTOR: f64 = 1.55;

/// Goal adjustments, checked in this order; the first match wins.
const GOAL_ADJUSTMENTS: [(HealthGoal, f64); 3] = [
    (HealthGoal::WeightLoss, 0.85),
    (HealthGoal::WeightGain, 1.15),
    (HealthGoal::MuscleGain, 1.10),
];

const PROTEIN_SHARE: f64 = 0.25;
const CARB_SHARE: f64 = 0.45;
const FAT_SHARE: f64 = 0.30;
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARB: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Daily targets derived from a profile. Recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionTargets {
    pub daily_calories: u32,
    pub daily_protein: u32,
    pub daily_carbs: u32,
    pub daily_fats: u32,
}

impl NutritionTargets {
    /// Splits a calorie figure 25/45/30 into protein/carb/fat grams.
    pub fn from_calories(daily_calories: u32) -> Self {
        let kcal = f64::from(daily_calories);
        Self {
            daily_calories,
            daily_protein: round_u32(kcal * PROTEIN_SHARE / KCAL_PER_G_PROTEIN),
            daily_carbs: round_u32(kcal * CARB_SHARE / KCAL_PER_G_CARB),
            daily_fats: round_u32(kcal * FAT_SHARE / KCAL_PER_G_FAT),
        }
    }
}

pub fn activity_factor(level: Option<ActivityLevel>) -> f64 {
    match level {
        Some(ActivityLevel::Sedentary) => 1.2,
        Some(ActivityLevel::LightlyActive) => 1.375,
        Some(ActivityLevel::ModeratelyActive) => 1.55,
        Some(ActivityLevel::VeryActive) => 1.725,
        Some(ActivityLevel::ExtremelyActive) => 1.9,
        None => DEFAULT_ACTIVITY_FACTOR,
    }
}

/// Harris-Benedict basal metabolic rate in kcal/day.
pub fn basal_metabolic_rate(gender: Option<Gender>, weight_kg: f64, height_cm: f64, age: u32) -> f64 {
    let age = f64::from(age);
    match gender {
        Some(Gender::Male) => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
        _ => 447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age,
    }
}

/// Computes daily calorie and macro targets for a profile.
///
/// # Errors
///
/// `InvalidProfile` when age, weight or height is missing, non-positive or
/// outside physiological bounds.
pub fn compute_targets(profile: &Profile) -> Result<NutritionTargets, PlanError> {
    let age = match profile.age {
        Some(a) if a > 0 && a <= MAX_AGE => a,
        Some(a) => return Err(PlanError::invalid_profile(format!("age {a} out of range"))),
        None => return Err(PlanError::invalid_profile("age is required")),
    };
    let weight_kg = bounded(profile.weight_kg(), MAX_WEIGHT_KG, "weight")?;
    let height_cm = bounded(profile.height_cm(), MAX_HEIGHT_CM, "height")?;

    let bmr = basal_metabolic_rate(profile.gender, weight_kg, height_cm, age);
    let mut calories = (bmr * activity_factor(profile.activity_level)).round();

    if let Some((_, factor)) = GOAL_ADJUSTMENTS
        .iter()
        .find(|(goal, _)| profile.has_goal(*goal))
    {
        calories = (calories * factor).round();
    }

    if calories <= 0.0 {
        return Err(PlanError::invalid_profile("profile yields non-positive energy needs"));
    }

    Ok(NutritionTargets::from_calories(round_u32(calories)))
}

fn bounded(value: Option<f64>, max: f64, field: &str) -> Result<f64, PlanError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 && v <= max => Ok(v),
        Some(v) => Err(PlanError::invalid_profile(format!("{field} {v} out of range"))),
        None => Err(PlanError::invalid_profile(format!("{field} is required"))),
    }
}

fn round_u32(v: f64) -> u32 {
    v.round().max(0.0) as u32
}
