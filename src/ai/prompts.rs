use std::fmt::Write;

use super::Prompt;
use crate::foods::model::FoodItem;
use crate::nutrition::NutritionTargets;
use crate::plans::composer::SLOT_SHARES;
use crate::profiles::Profile;

fn system_message(cuisine: &str) -> String {
    format!(
        "You are a professional nutritionist specializing in {cuisine} cuisine. \
         Respond with a single valid JSON object and nothing else."
    )
}

fn join_or<T: AsRef<str>>(values: &[T], empty: &str) -> String {
    if values.is_empty() {
        empty.to_string()
    } else {
        values.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
    }
}

fn describe_food(food: &FoodItem) -> String {
    format!(
        "{} ({} cal/100g, {}g protein, {}g carbs, {}g fats)",
        food.name, food.calories, food.protein, food.carbs, food.fats
    )
}

/// Prompt asking for a full day's plan drawn only from `foods`.
pub fn diet_plan_prompt(
    profile: &Profile,
    targets: &NutritionTargets,
    foods: &[FoodItem],
    cuisine: &str,
) -> Prompt {
    let goals: Vec<&str> = profile.health_goals.iter().map(|g| g.as_str()).collect();
    let prefs: Vec<&str> = profile.dietary_preferences.iter().map(|p| p.as_str()).collect();
    let allergies: Vec<&str> = profile.allergies.iter().map(|a| a.name.as_str()).collect();
    let food_list: Vec<String> = foods.iter().map(describe_food).collect();

    let mut user = String::new();
    // writes into a String cannot fail
    let _ = writeln!(user, "Create a personalized one-day diet plan for a user who eats {cuisine} food.");
    let _ = writeln!(user);
    let _ = writeln!(user, "User profile:");
    let _ = writeln!(user, "- Age: {}", profile.age.map_or("unknown".into(), |a| format!("{a} years")));
    let _ = writeln!(user, "- Gender: {}", profile.gender.map_or("not specified", |g| g.as_str()));
    let _ = writeln!(user, "- Weight: {} {}", opt_num(profile.weight), profile.weight_unit.as_str());
    let _ = writeln!(user, "- Height: {} {}", opt_num(profile.height), profile.height_unit.as_str());
    let _ = writeln!(
        user,
        "- BMI: {}",
        profile.bmi().map_or("not calculated".into(), |b| format!("{b:.1}"))
    );
    let _ = writeln!(
        user,
        "- Activity level: {}",
        profile.activity_level.map_or("not specified", |a| a.as_str())
    );
    let _ = writeln!(user, "- Health goals: {}", join_or(&goals, "maintenance"));
    let _ = writeln!(user, "- Dietary preferences: {}", join_or(&prefs, "none"));
    let _ = writeln!(user, "- Allergies: {}", join_or(&allergies, "none"));
    let _ = writeln!(user);
    let _ = writeln!(user, "Daily targets:");
    let _ = writeln!(user, "- Calories: {} kcal", targets.daily_calories);
    let _ = writeln!(user, "- Protein: {}g", targets.daily_protein);
    let _ = writeln!(user, "- Carbohydrates: {}g", targets.daily_carbs);
    let _ = writeln!(user, "- Fats: {}g", targets.daily_fats);
    let _ = writeln!(user);
    let _ = writeln!(user, "Available foods (use only these, nutrients per 100g):");
    let _ = writeln!(user, "{}", food_list.join(", "));
    let _ = writeln!(user);
    let _ = writeln!(user, "Meals and their share of daily calories:");
    for (slot, share) in SLOT_SHARES {
        let _ = writeln!(user, "- {}: {:.0}%", slot.as_str(), share * 100.0);
    }
    let _ = writeln!(user);
    let _ = writeln!(
        user,
        "Give each item a quantity in grams with its calories, protein, carbs and fats \
         for that quantity. Respect the dietary preferences and avoid the allergens. \
         Keep the day close to {} kcal and practical to cook at home.",
        targets.daily_calories
    );
    let _ = writeln!(user);
    let _ = writeln!(user, "Reply with JSON in exactly this shape:");
    let _ = write!(
        user,
        r#"{{"meals":[{{"mealType":"breakfast","items":[{{"name":"Food Name","quantity":100,"unit":"grams","calories":250,"protein":10,"carbs":30,"fats":8}}],"totalCalories":250,"notes":"optional"}}],"dailyCalories":{},"dailyProtein":{},"dailyCarbs":{},"dailyFats":{}}}"#,
        targets.daily_calories, targets.daily_protein, targets.daily_carbs, targets.daily_fats
    );

    Prompt {
        system: system_message(cuisine),
        user,
    }
}

/// Prompt asking for a starter catalog of regional foods.
pub fn food_catalog_prompt(cuisine: &str) -> Prompt {
    let user = format!(
        "List between 50 and 100 common {cuisine} foods covering breads, rice, curries, \
         lentils, vegetables, meat, snacks, desserts and beverages. Nutrients are per 100g \
         (or 100ml for drinks). mealType may contain breakfast, lunch, dinner, snack, side \
         or dessert. Reply with JSON in exactly this shape:\n\
         {{\"foods\":[{{\"name\":\"Roti\",\"calories\":297,\"protein\":7.85,\"carbs\":58,\"fats\":7.45,\
         \"mealType\":[\"breakfast\",\"lunch\",\"dinner\"],\"category\":\"bread\",\
         \"isVegetarian\":true,\"isVegan\":true,\"isGlutenFree\":false,\"isDairyFree\":true,\
         \"allergens\":[\"wheat\"],\"typicalServing\":50,\"servingUnit\":\"grams\"}}]}}"
    );
    Prompt {
        system: system_message(cuisine),
        user,
    }
}

fn opt_num(v: Option<f64>) -> String {
    v.map_or_else(|| "unknown".to_string(), |n| format!("{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::builtin::builtin_foods;
    use crate::profiles::model::{Allergy, DietaryPreference, Gender};

    #[test]
    fn plan_prompt_carries_profile_targets_and_foods() {
        let profile = Profile {
            age: Some(30),
            gender: Some(Gender::Male),
            weight: Some(70.0),
            height: Some(175.0),
            dietary_preferences: vec![DietaryPreference::Vegetarian],
            allergies: vec![Allergy::named("nuts")],
            ..Profile::default()
        };
        let targets = NutritionTargets::from_calories(2628);
        let foods = builtin_foods();

        let prompt = diet_plan_prompt(&profile, &targets, &foods[..2], "Pakistani");
        assert!(prompt.system.contains("Pakistani"));
        assert!(prompt.user.contains("BMI: 22.9"));
        assert!(prompt.user.contains("Calories: 2628 kcal"));
        assert!(prompt.user.contains("Roti (297 cal/100g, 7.85g protein, 58g carbs, 7.45g fats)"));
        assert!(prompt.user.contains("Allergies: nuts"));
        assert!(prompt.user.contains("vegetarian"));
        assert!(prompt.user.contains("- lunch: 35%"));
        assert!(prompt.user.contains("\"dailyCalories\":2628"));
    }

    #[test]
    fn catalog_prompt_names_the_cuisine() {
        let prompt = food_catalog_prompt("Turkish");
        assert!(prompt.user.contains("common Turkish foods"));
        assert!(prompt.user.contains("\"foods\""));
    }
}
