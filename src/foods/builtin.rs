use super::model::FoodItem;

struct Seed {
    name: &'static str,
    category: &'static str,
    meal_type: &'static [&'static str],
    // kcal, protein, carbs, fats per 100 g
    macros: (f64, f64, f64, f64),
    // vegetarian, vegan, gluten free, dairy free
    flags: (bool, bool, bool, bool),
    allergens: &'static [&'static str],
    serving: (f64, &'static str),
}

const SEEDS: &[Seed] = &[
    Seed { name: "Roti", category: "bread", meal_type: &["breakfast", "lunch", "dinner"], macros: (297.0, 7.85, 58.0, 7.45), flags: (true, true, false, true), allergens: &["wheat"], serving: (50.0, "grams") },
    Seed { name: "Naan", category: "bread", meal_type: &["lunch", "dinner"], macros: (310.0, 8.0, 50.0, 9.0), flags: (true, false, false, false), allergens: &["wheat", "dairy"], serving: (60.0, "grams") },
    Seed { name: "Basmati Rice", category: "rice", meal_type: &["lunch", "dinner"], macros: (130.0, 2.7, 28.0, 0.3), flags: (true, true, true, true), allergens: &[], serving: (150.0, "grams") },
    Seed { name: "Biryani", category: "rice", meal_type: &["lunch", "dinner"], macros: (250.0, 12.0, 35.0, 7.0), flags: (false, false, true, true), allergens: &[], serving: (200.0, "grams") },
    Seed { name: "Chicken Karahi", category: "curry", meal_type: &["lunch", "dinner"], macros: (180.0, 20.0, 5.0, 8.0), flags: (false, false, true, true), allergens: &[], serving: (150.0, "grams") },
    Seed { name: "Daal", category: "dal", meal_type: &["lunch", "dinner"], macros: (116.0, 7.0, 20.0, 1.5), flags: (true, true, true, true), allergens: &[], serving: (150.0, "grams") },
    Seed { name: "Aloo Gobi", category: "vegetable", meal_type: &["lunch", "dinner"], macros: (85.0, 2.5, 12.0, 3.0), flags: (true, true, true, true), allergens: &[], serving: (150.0, "grams") },
    Seed { name: "Paratha", category: "bread", meal_type: &["breakfast", "lunch"], macros: (326.0, 6.0, 45.0, 14.0), flags: (true, false, false, false), allergens: &["wheat", "dairy"], serving: (80.0, "grams") },
    Seed { name: "Halwa Puri", category: "other", meal_type: &["breakfast"], macros: (350.0, 5.0, 45.0, 16.0), flags: (true, false, false, false), allergens: &["wheat", "dairy"], serving: (100.0, "grams") },
    Seed { name: "Chai", category: "beverage", meal_type: &["breakfast", "snack"], macros: (30.0, 1.0, 5.0, 1.0), flags: (true, false, true, false), allergens: &["dairy"], serving: (200.0, "ml") },
    Seed { name: "Samosa", category: "snack", meal_type: &["snack"], macros: (262.0, 4.2, 33.0, 12.0), flags: (true, true, false, true), allergens: &["wheat"], serving: (50.0, "grams") },
    Seed { name: "Pakora", category: "snack", meal_type: &["snack"], macros: (200.0, 5.0, 20.0, 10.0), flags: (true, true, false, true), allergens: &["wheat"], serving: (50.0, "grams") },
    Seed { name: "Kheer", category: "dessert", meal_type: &["snack", "dessert"], macros: (150.0, 3.0, 25.0, 4.0), flags: (true, false, true, false), allergens: &["dairy", "nuts"], serving: (100.0, "grams") },
    Seed { name: "Chana Masala", category: "curry", meal_type: &["lunch", "dinner"], macros: (140.0, 7.0, 22.0, 3.0), flags: (true, true, true, true), allergens: &[], serving: (150.0, "grams") },
    Seed { name: "Bhindi Masala", category: "vegetable", meal_type: &["lunch", "dinner"], macros: (90.0, 2.5, 10.0, 4.0), flags: (true, true, true, true), allergens: &[], serving: (150.0, "grams") },
    Seed { name: "Karahi Gosht", category: "meat", meal_type: &["lunch", "dinner"], macros: (220.0, 25.0, 3.0, 11.0), flags: (false, false, true, true), allergens: &[], serving: (150.0, "grams") },
    Seed { name: "Raita", category: "side", meal_type: &["lunch", "dinner", "side"], macros: (60.0, 2.0, 5.0, 3.0), flags: (true, false, true, false), allergens: &["dairy"], serving: (100.0, "grams") },
    Seed { name: "Aloo Paratha", category: "bread", meal_type: &["breakfast", "lunch"], macros: (350.0, 7.0, 50.0, 14.0), flags: (true, false, false, false), allergens: &["wheat", "dairy"], serving: (100.0, "grams") },
    Seed { name: "Chicken Tikka", category: "meat", meal_type: &["lunch", "dinner"], macros: (200.0, 22.0, 2.0, 10.0), flags: (false, false, true, true), allergens: &[], serving: (100.0, "grams") },
    Seed { name: "Lassi", category: "beverage", meal_type: &["breakfast", "snack"], macros: (100.0, 3.0, 12.0, 4.0), flags: (true, false, true, false), allergens: &["dairy"], serving: (250.0, "ml") },
    Seed { name: "Gulab Jamun", category: "dessert", meal_type: &["snack", "dessert"], macros: (150.0, 2.0, 28.0, 4.0), flags: (true, false, false, false), allergens: &["wheat", "dairy"], serving: (40.0, "grams") },
];

/// Fixed catalog used when no generative backend can produce one.
pub fn builtin_foods() -> Vec<FoodItem> {
    SEEDS
        .iter()
        .map(|s| FoodItem {
            name: s.name.to_string(),
            calories: s.macros.0,
            protein: s.macros.1,
            carbs: s.macros.2,
            fats: s.macros.3,
            meal_type: s.meal_type.iter().map(|t| t.to_string()).collect(),
            category: s.category.to_string(),
            typical_serving: s.serving.0,
            serving_unit: s.serving.1.to_string(),
            is_vegetarian: s.flags.0,
            is_vegan: s.flags.1,
            is_gluten_free: s.flags.2,
            is_dairy_free: s.flags.3,
            allergens: s.allergens.iter().map(|a| a.to_string()).collect(),
        })
        .collect()
}
