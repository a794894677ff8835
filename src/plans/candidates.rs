use tracing::{info, warn};

use crate::foods::catalog::FoodCatalog;
use crate::foods::model::{DietaryFlag, FoodFilter, FoodItem};
use crate::profiles::Profile;

/// Upper bound on catalog rows read per request.
pub const CATALOG_READ_LIMIT: i64 = 200;

pub fn preference_flags(profile: &Profile) -> Vec<DietaryFlag> {
    let mut flags = Vec::new();
    for pref in &profile.dietary_preferences {
        if let Ok(flag) = DietaryFlag::try_from(*pref) {
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }
    }
    flags
}

/// Drops foods carrying any of `allergens`. If that would leave nothing,
/// the unfiltered list is kept and a warning logged.
pub fn exclude_allergens(foods: Vec<FoodItem>, allergens: &[String]) -> Vec<FoodItem> {
    if allergens.is_empty() {
        return foods;
    }
    let safe: Vec<FoodItem> = foods
        .iter()
        .filter(|f| !f.contains_any_allergen(allergens))
        .cloned()
        .collect();
    if safe.is_empty() && !foods.is_empty() {
        warn!(?allergens, "allergen filter removed every food, ignoring it");
        return foods;
    }
    safe
}

/// Foods eligible for this profile, shared by the generative and the
/// rule-based paths. Both filters are soft: an empty result falls back to
/// the previous step.
pub async fn select_candidates(
    catalog: &dyn FoodCatalog,
    profile: &Profile,
) -> anyhow::Result<Vec<FoodItem>> {
    let flags = preference_flags(profile);

    let mut foods = Vec::new();
    if !flags.is_empty() {
        foods = catalog
            .query(&FoodFilter::any_of(flags).limit(CATALOG_READ_LIMIT))
            .await?;
        if foods.is_empty() {
            info!("no food matches the dietary preferences, using the full catalog");
        }
    }
    if foods.is_empty() {
        foods = catalog
            .query(&FoodFilter::all().limit(CATALOG_READ_LIMIT))
            .await?;
    }

    Ok(exclude_allergens(foods, &profile.allergen_names()))
}
