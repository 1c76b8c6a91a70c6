use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// A catalogue food, nutrients per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// Request payload for adding a food to the catalogue
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateFoodItemRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 200, message = "Brand cannot exceed 200 characters"))]
    pub brand: Option<String>,

    #[validate(range(min = 0.0, max = 900.0, message = "Calories per 100 g must be between 0 and 900"))]
    pub calories_kcal: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Protein per 100 g must be between 0 and 100"))]
    pub protein_g: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Carbs per 100 g must be between 0 and 100"))]
    pub carbs_g: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Fat per 100 g must be between 0 and 100"))]
    pub fat_g: f64,
}

/// A user's diet plan: macro targets plus alternative days of eating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DietPlan {
    pub id: String,
    pub user_id: String,
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_carbs: f64,
    pub target_fat: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub variations: Vec<DietVariation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DietVariation {
    pub id: String,
    pub name: String,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Meal {
    pub id: String,
    pub name: String,
    /// Position within the variation, starting at 0
    pub order_index: usize,
    pub items: Vec<MealItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MealItem {
    pub id: String,
    pub quantity_grams: f64,
    pub food: FoodItem,
}

/// Request payload for creating a plan; it becomes the user's active plan
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateDietPlanRequest {
    #[validate(length(min = 1, max = 128, message = "user_id must be between 1 and 128 characters"))]
    pub user_id: String,

    #[validate(range(min = 0.0, max = 20000.0, message = "Calorie target must be between 0 and 20000"))]
    pub target_calories: f64,

    #[validate(range(min = 0.0, max = 2000.0, message = "Protein target must be between 0 and 2000 g"))]
    pub target_protein: f64,

    #[validate(range(min = 0.0, max = 2000.0, message = "Carbohydrate target must be between 0 and 2000 g"))]
    pub target_carbs: f64,

    #[validate(range(min = 0.0, max = 2000.0, message = "Fat target must be between 0 and 2000 g"))]
    pub target_fat: f64,

    /// Variations in display order; a single default variation is created when empty
    #[serde(default)]
    #[validate]
    pub variations: Vec<CreateDietVariation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateDietVariation {
    #[validate(length(min = 1, max = 100, message = "Variation name must be between 1 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate]
    pub meals: Vec<CreateMeal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateMeal {
    #[validate(length(min = 1, max = 100, message = "Meal name must be between 1 and 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate]
    pub items: Vec<CreateMealItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateMealItem {
    #[validate(length(min = 1, message = "food_item_id is required"))]
    pub food_item_id: String,

    #[validate(range(min = 0.1, max = 5000.0, message = "Quantity must be between 0.1 and 5000 g"))]
    pub quantity_grams: f64,
}

/// Request payload for adding an empty meal to a plan
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateMealRequest {
    #[validate(length(min = 1, max = 100, message = "Meal name must be between 1 and 100 characters"))]
    pub name: String,

    /// Variation to add the meal to; the plan's first variation when absent
    #[serde(default)]
    pub variation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RenameMealRequest {
    #[validate(length(min = 1, max = 100, message = "Meal name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateMealItemRequest {
    #[validate(range(min = 0.1, max = 5000.0, message = "Quantity must be between 0.1 and 5000 g"))]
    pub quantity_grams: f64,
}

/// New plan targets; only the fields present are changed
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateTargetsRequest {
    #[validate(range(min = 0.0, max = 20000.0, message = "Calorie target must be between 0 and 20000"))]
    pub target_calories: Option<f64>,

    #[validate(range(min = 0.0, max = 2000.0, message = "Protein target must be between 0 and 2000 g"))]
    pub target_protein: Option<f64>,

    #[validate(range(min = 0.0, max = 2000.0, message = "Carbohydrate target must be between 0 and 2000 g"))]
    pub target_carbs: Option<f64>,

    #[validate(range(min = 0.0, max = 2000.0, message = "Fat target must be between 0 and 2000 g"))]
    pub target_fat: Option<f64>,
}

/// Energy and macro totals, always derived from the meal items
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct NutrientTotals {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl std::ops::Add for NutrientTotals {
    type Output = NutrientTotals;

    fn add(self, other: NutrientTotals) -> NutrientTotals {
        NutrientTotals {
            calories_kcal: self.calories_kcal + other.calories_kcal,
            protein_g: self.protein_g + other.protein_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fat_g: self.fat_g + other.fat_g,
        }
    }
}

impl std::iter::Sum for NutrientTotals {
    fn sum<I: Iterator<Item = NutrientTotals>>(iter: I) -> Self {
        iter.fold(NutrientTotals::default(), |acc, totals| acc + totals)
    }
}

/// Actual intake of one macro against its target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MacroComparison {
    pub target: f64,
    pub actual: f64,
    /// actual - target
    pub difference: f64,
    /// actual / target * 100, or 0 when the target is 0
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MacroComparisons {
    pub calories: MacroComparison,
    pub protein: MacroComparison,
    pub carbs: MacroComparison,
    pub fat: MacroComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MealSummary {
    pub meal_id: String,
    pub name: String,
    pub totals: NutrientTotals,
}

/// One meal with its items and their combined totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MealDetails {
    pub meal_id: String,
    pub name: String,
    pub items: Vec<MealItem>,
    pub totals: NutrientTotals,
}

/// One meal item and what it contributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MealItemDetails {
    pub item: MealItem,
    pub totals: NutrientTotals,
}

/// Totals of one variation and how they compare to the plan targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VariationSummary {
    pub variation_id: String,
    pub name: String,
    pub meals: Vec<MealSummary>,
    pub totals: NutrientTotals,
    pub comparison: MacroComparisons,
}

/// The active plan together with its derived figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DietPlanDetails {
    pub plan: DietPlan,
    pub variations: Vec<VariationSummary>,
}
