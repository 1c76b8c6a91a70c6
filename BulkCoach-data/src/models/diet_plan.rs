use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::food::FoodItem;

/// Storage model for a diet plan with its nested variations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub id: String,
    pub user_id: String,
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_carbs: f64,
    pub target_fat: f64,
    /// Only one plan per user is active at a time
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Variations in display order
    pub variations: Vec<DietVariation>,
}

/// A named alternative day of eating within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietVariation {
    pub id: String,
    pub name: String,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    pub items: Vec<MealItem>,
}

/// A quantity of a catalogue food, carried with the food it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    pub id: String,
    pub quantity_grams: f64,
    pub food: FoodItem,
}

/// Input data for creating a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDietPlanRequest {
    pub user_id: String,
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_carbs: f64,
    pub target_fat: f64,
    pub variations: Vec<CreateDietVariation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDietVariation {
    pub name: String,
    pub meals: Vec<CreateMeal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMeal {
    pub name: String,
    pub items: Vec<CreateMealItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMealItem {
    pub food_item_id: String,
    pub quantity_grams: f64,
}

/// Absolute new values for the targets of a plan, unset fields are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetUpdate {
    pub target_calories: Option<f64>,
    pub target_protein: Option<f64>,
    pub target_carbs: Option<f64>,
    pub target_fat: Option<f64>,
}

impl TargetUpdate {
    /// Write the set fields into `plan`, refusing negative values
    pub fn apply_to(&self, plan: &mut DietPlan) -> Result<(), String> {
        let fields = [
            ("target_calories", self.target_calories),
            ("target_protein", self.target_protein),
            ("target_carbs", self.target_carbs),
            ("target_fat", self.target_fat),
        ];
        for (name, value) in fields {
            if let Some(value) = value.filter(|v| *v < 0.0) {
                return Err(format!("{} cannot be negative (got {:.1})", name, value));
            }
        }

        if let Some(value) = self.target_calories {
            plan.target_calories = value;
        }
        if let Some(value) = self.target_protein {
            plan.target_protein = value;
        }
        if let Some(value) = self.target_carbs {
            plan.target_carbs = value;
        }
        if let Some(value) = self.target_fat {
            plan.target_fat = value;
        }
        Ok(())
    }
}

/// A coaching adjustment to apply to the active plan of a user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoachAdjustment {
    /// Change to the calorie target, may be negative
    pub calorie_delta: f64,
    /// Change to the carbohydrate target in grams, may be negative
    pub carb_delta: f64,
    /// Anchor: current-week average weight
    pub w_curr: f64,
    /// Anchor: previous-week average weight
    pub w_prev: f64,
}

/// Result of applying a coaching adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdjustmentOutcome {
    /// Targets were updated and the anchor recorded as applied
    Applied(DietPlan),
    /// The anchor had already been recorded, targets were left untouched
    AlreadyApplied(DietPlan),
}

impl AdjustmentOutcome {
    pub fn plan(&self) -> &DietPlan {
        match self {
            AdjustmentOutcome::Applied(plan) | AdjustmentOutcome::AlreadyApplied(plan) => plan,
        }
    }

    pub fn into_plan(self) -> DietPlan {
        match self {
            AdjustmentOutcome::Applied(plan) | AdjustmentOutcome::AlreadyApplied(plan) => plan,
        }
    }
}

/// Apply target deltas, refusing any result below zero
pub fn adjusted_targets(plan: &DietPlan, calorie_delta: f64, carb_delta: f64) -> Result<(f64, f64), String> {
    let calories = plan.target_calories + calorie_delta;
    let carbs = plan.target_carbs + carb_delta;

    if calories < 0.0 || carbs < 0.0 {
        return Err(format!(
            "adjustment would make targets negative (calories {:.1}, carbs {:.1})",
            calories, carbs
        ));
    }

    Ok((calories, carbs))
}
