use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Storage model for a catalogue food, nutrients per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub created_at: DateTime<Utc>,
}

/// Input data for adding a food to the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFoodItemRequest {
    pub name: String,
    pub brand: Option<String>,
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}
