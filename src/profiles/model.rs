use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use time_tz::{timezones, OffsetDateTimeExt};

const LBS_TO_KG: f64 = 0.453592;
const FT_TO_CM: f64 = 30.48;
const INCH_TO_CM: f64 = 2.54;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    #[default]
    Cm,
    Ft,
    Inches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoal {
    WeightLoss,
    WeightGain,
    MuscleGain,
    Maintenance,
    ImproveHealth,
    ManageCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreference {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
    Keto,
    Paleo,
    Mediterranean,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allergy {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
impl Allergy {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity: None,
            notes: None,
        }
    }
}

/// Physiological snapshot the planner works from. Owned by the profile
/// collaborator; the planner only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    pub height: Option<f64>,
    #[serde(default)]
    pub height_unit: HeightUnit,
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub health_goals: Vec<HealthGoal>,
    #[serde(default)]
    pub dietary_preferences: Vec<DietaryPreference>,
    #[serde(default)]
    pub allergies: Vec<Allergy>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            age: None,
            gender: None,
            weight: None,
            weight_unit: WeightUnit::Kg,
            height: None,
            height_unit: HeightUnit::Cm,
            activity_level: None,
            health_goals: Vec::new(),
            dietary_preferences: Vec::new(),
            allergies: Vec::new(),
            timezone: default_timezone(),
        }
    }
}

impl Profile {
    pub fn weight_kg(&self) -> Option<f64> {
        self.weight.map(|w| match self.weight_unit {
            WeightUnit::Kg => w,
            WeightUnit::Lbs => w * LBS_TO_KG,
        })
    }

    pub fn height_cm(&self) -> Option<f64> {
        self.height.map(|h| match self.height_unit {
            HeightUnit::Cm => h,
            HeightUnit::Ft => h * FT_TO_CM,
            HeightUnit::Inches => h * INCH_TO_CM,
        })
    }

    pub fn bmi(&self) -> Option<f64> {
        let kg = self.weight_kg()?;
        let m = self.height_cm()? / 100.0;
        (kg > 0.0 && m > 0.0).then(|| kg / (m * m))
    }

    pub fn has_goal(&self, goal: HealthGoal) -> bool {
        self.health_goals.contains(&goal)
    }

    pub fn allergen_names(&self) -> Vec<String> {
        self.allergies
            .iter()
            .map(|a| a.name.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

/// Calendar date "now" in the named timezone; unknown zones fall back to UTC.
pub fn local_today(tz_name: &str) -> Date {
    let now = OffsetDateTime::now_utc();
    match timezones::get_by_name(tz_name) {
        Some(tz) => now.to_timezone(tz).date(),
        None => {
            tracing::warn!(timezone = %tz_name, "unknown timezone, using UTC");
            now.date()
        }
    }
}

/// Whole years between `dob` and `today`; `None` for future birth dates.
pub fn age_on(dob: Date, today: Date) -> Option<u32> {
    if dob > today {
        return None;
    }
    let mut years = today.year() - dob.year();
    if (today.month() as u8, today.day()) < (dob.month() as u8, dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "prefer_not_to_say" => Ok(Gender::PreferNotToSay),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer_not_to_say",
        }
    }
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "lbs" => Ok(WeightUnit::Lbs),
            other => Err(format!("unknown weight unit: {other}")),
        }
    }
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }
}

impl FromStr for HeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cm" => Ok(HeightUnit::Cm),
            "ft" => Ok(HeightUnit::Ft),
            "inches" => Ok(HeightUnit::Inches),
            other => Err(format!("unknown height unit: {other}")),
        }
    }
}

impl HeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeightUnit::Cm => "cm",
            HeightUnit::Ft => "ft",
            HeightUnit::Inches => "inches",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "lightly_active" => Ok(ActivityLevel::LightlyActive),
            "moderately_active" => Ok(ActivityLevel::ModeratelyActive),
            "very_active" => Ok(ActivityLevel::VeryActive),
            "extremely_active" => Ok(ActivityLevel::ExtremelyActive),
            other => Err(format!("unknown activity level: {other}")),
        }
    }
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtremelyActive => "extremely_active",
        }
    }
}

impl FromStr for HealthGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weight_loss" => Ok(HealthGoal::WeightLoss),
            "weight_gain" => Ok(HealthGoal::WeightGain),
            "muscle_gain" => Ok(HealthGoal::MuscleGain),
            "maintenance" => Ok(HealthGoal::Maintenance),
            "improve_health" => Ok(HealthGoal::ImproveHealth),
            "manage_condition" => Ok(HealthGoal::ManageCondition),
            other => Err(format!("unknown health goal: {other}")),
        }
    }
}

impl HealthGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthGoal::WeightLoss => "weight_loss",
            HealthGoal::WeightGain => "weight_gain",
            HealthGoal::MuscleGain => "muscle_gain",
            HealthGoal::Maintenance => "maintenance",
            HealthGoal::ImproveHealth => "improve_health",
            HealthGoal::ManageCondition => "manage_condition",
        }
    }
}

impl FromStr for DietaryPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vegetarian" => Ok(DietaryPreference::Vegetarian),
            "vegan" => Ok(DietaryPreference::Vegan),
            "gluten_free" => Ok(DietaryPreference::GlutenFree),
            "dairy_free" => Ok(DietaryPreference::DairyFree),
            "keto" => Ok(DietaryPreference::Keto),
            "paleo" => Ok(DietaryPreference::Paleo),
            "mediterranean" => Ok(DietaryPreference::Mediterranean),
            "none" => Ok(DietaryPreference::None),
            other => Err(format!("unknown dietary preference: {other}")),
        }
    }
}

impl DietaryPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            DietaryPreference::Vegetarian => "vegetarian",
            DietaryPreference::Vegan => "vegan",
            DietaryPreference::GlutenFree => "gluten_free",
            DietaryPreference::DairyFree => "dairy_free",
            DietaryPreference::Keto => "keto",
            DietaryPreference::Paleo => "paleo",
            DietaryPreference::Mediterranean => "mediterranean",
            DietaryPreference::None => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn normalizes_imperial_units() {
        let p = Profile {
            weight: Some(154.0),
            weight_unit: WeightUnit::Lbs,
            height: Some(69.0),
            height_unit: HeightUnit::Inches,
            ..Profile::default()
        };
        assert!((p.weight_kg().unwrap() - 69.853).abs() < 0.01);
        assert!((p.height_cm().unwrap() - 175.26).abs() < 0.01);

        let feet = Profile {
            height: Some(5.75),
            height_unit: HeightUnit::Ft,
            ..Profile::default()
        };
        assert!((feet.height_cm().unwrap() - 175.26).abs() < 0.01);
    }

    #[test]
    fn bmi_from_metric_profile() {
        let p = Profile {
            weight: Some(70.0),
            height: Some(175.0),
            ..Profile::default()
        };
        assert!((p.bmi().unwrap() - 22.857).abs() < 0.01);
        assert_eq!(Profile::default().bmi(), None);
    }

    #[test]
    fn age_counts_completed_years() {
        assert_eq!(age_on(date!(1995 - 06 - 15), date!(2025 - 06 - 14)), Some(29));
        assert_eq!(age_on(date!(1995 - 06 - 15), date!(2025 - 06 - 15)), Some(30));
        assert_eq!(age_on(date!(2030 - 01 - 01), date!(2025 - 06 - 15)), None);
    }

    #[test]
    fn enum_text_round_trips_through_from_str() {
        assert_eq!("Lightly_Active".parse::<ActivityLevel>(), Ok(ActivityLevel::LightlyActive));
        assert_eq!(HealthGoal::MuscleGain.as_str(), "muscle_gain");
        assert!("couch_potato".parse::<ActivityLevel>().is_err());

        for goal in [HealthGoal::WeightLoss, HealthGoal::ImproveHealth, HealthGoal::ManageCondition] {
            assert_eq!(goal.as_str().parse::<HealthGoal>(), Ok(goal));
        }
        for pref in [DietaryPreference::GlutenFree, DietaryPreference::None] {
            assert_eq!(pref.as_str().parse::<DietaryPreference>(), Ok(pref));
        }
        assert_eq!(" FT ".parse::<HeightUnit>(), Ok(HeightUnit::Ft));
        assert_eq!(Gender::PreferNotToSay.as_str(), "prefer_not_to_say");
        assert_eq!(
            "lbs ".parse::<WeightUnit>().map(|u| u.as_str()),
            Ok("lbs")
        );
        assert_eq!(
            "robot".parse::<Gender>(),
            Err("unknown gender: robot".to_string())
        );
    }

    #[test]
    fn unknown_timezone_still_yields_a_date() {
        let utc = OffsetDateTime::now_utc().date();
        let d = local_today("Mars/Olympus_Mons");
        assert!((d - utc).whole_days().abs() <= 1);
    }
}
