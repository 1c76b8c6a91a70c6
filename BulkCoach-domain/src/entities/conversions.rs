use bulk_coach_data::models::{body_log as data_body_log, diet_plan as data_plan, dismissal as data_dismissal, food as data_food};

use crate::entities::body_log::{BodyLogEntry, Circumferences, CreateBodyLogRequest, Skinfolds};
use crate::entities::coaching::{Anchor, DismissalRecord};
use crate::entities::diet::{
    CreateDietPlanRequest, CreateFoodItemRequest, CreateMealItem, DietPlan, DietVariation, FoodItem, Meal, MealItem,
    UpdateTargetsRequest,
};

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

pub fn convert_to_domain_skinfolds(data: data_body_log::Skinfolds) -> Skinfolds {
    Skinfolds {
        chest: data.chest,
        axillary: data.axillary,
        triceps: data.triceps,
        subscapular: data.subscapular,
        suprailiac: data.suprailiac,
        abdominal: data.abdominal,
        thigh: data.thigh,
    }
}

pub fn convert_to_data_skinfolds(domain: &Skinfolds) -> data_body_log::Skinfolds {
    data_body_log::Skinfolds {
        chest: domain.chest,
        axillary: domain.axillary,
        triceps: domain.triceps,
        subscapular: domain.subscapular,
        suprailiac: domain.suprailiac,
        abdominal: domain.abdominal,
        thigh: domain.thigh,
    }
}

pub fn convert_to_domain_circumferences(data: data_body_log::Circumferences) -> Circumferences {
    Circumferences {
        neck: data.neck,
        shoulder: data.shoulder,
        chest_relaxed: data.chest_relaxed,
        arm_relaxed_right: data.arm_relaxed_right,
        arm_relaxed_left: data.arm_relaxed_left,
        arm_contracted_right: data.arm_contracted_right,
        arm_contracted_left: data.arm_contracted_left,
        forearm_right: data.forearm_right,
        forearm_left: data.forearm_left,
        waist: data.waist,
        abdomen: data.abdomen,
        hips: data.hips,
        thigh_proximal_right: data.thigh_proximal_right,
        thigh_proximal_left: data.thigh_proximal_left,
        calf_right: data.calf_right,
        calf_left: data.calf_left,
    }
}

pub fn convert_to_data_circumferences(domain: &Circumferences) -> data_body_log::Circumferences {
    data_body_log::Circumferences {
        neck: domain.neck,
        shoulder: domain.shoulder,
        chest_relaxed: domain.chest_relaxed,
        arm_relaxed_right: domain.arm_relaxed_right,
        arm_relaxed_left: domain.arm_relaxed_left,
        arm_contracted_right: domain.arm_contracted_right,
        arm_contracted_left: domain.arm_contracted_left,
        forearm_right: domain.forearm_right,
        forearm_left: domain.forearm_left,
        waist: domain.waist,
        abdomen: domain.abdomen,
        hips: domain.hips,
        thigh_proximal_right: domain.thigh_proximal_right,
        thigh_proximal_left: domain.thigh_proximal_left,
        calf_right: domain.calf_right,
        calf_left: domain.calf_left,
    }
}

/// Convert from data model to domain entity for a body log
pub fn convert_to_domain_body_log(data: data_body_log::BodyLog) -> BodyLogEntry {
    BodyLogEntry {
        id: data.id,
        user_id: data.user_id,
        date: data.date,
        weight_kg: data.weight_kg,
        bio_body_fat_percent: data.bio_body_fat_percent,
        bio_muscle_mass_kg: data.bio_muscle_mass_kg,
        skinfolds: convert_to_domain_skinfolds(data.skinfolds),
        circumferences: convert_to_domain_circumferences(data.circumferences),
        calculated_body_density: data.calculated_body_density,
        calculated_body_fat_percent: data.calculated_body_fat_percent,
    }
}

/// Convert a create request to the data model, attaching the derived skinfold figures
pub fn convert_to_data_body_log_request(
    domain: &CreateBodyLogRequest,
    calculated_body_density: Option<f64>,
    calculated_body_fat_percent: Option<f64>,
) -> data_body_log::CreateBodyLogRequest {
    data_body_log::CreateBodyLogRequest {
        user_id: domain.user_id.clone(),
        date: domain.date,
        weight_kg: domain.weight_kg,
        bio_body_fat_percent: domain.bio_body_fat_percent,
        bio_muscle_mass_kg: domain.bio_muscle_mass_kg,
        skinfolds: convert_to_data_skinfolds(&domain.skinfolds),
        circumferences: convert_to_data_circumferences(&domain.circumferences),
        calculated_body_density,
        calculated_body_fat_percent,
    }
}

pub fn convert_to_domain_food(data: data_food::FoodItem) -> FoodItem {
    FoodItem {
        id: data.id,
        name: data.name,
        brand: data.brand,
        calories_kcal: data.calories_kcal,
        protein_g: data.protein_g,
        carbs_g: data.carbs_g,
        fat_g: data.fat_g,
    }
}

pub fn convert_to_data_food_request(domain: &CreateFoodItemRequest) -> data_food::CreateFoodItemRequest {
    data_food::CreateFoodItemRequest {
        name: domain.name.trim().to_string(),
        brand: domain.brand.as_ref().map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
        calories_kcal: domain.calories_kcal,
        protein_g: domain.protein_g,
        carbs_g: domain.carbs_g,
        fat_g: domain.fat_g,
    }
}

/// Convert from data model to domain entity for a diet plan, numbering meals by position
pub fn convert_to_domain_plan(data: data_plan::DietPlan) -> DietPlan {
    DietPlan {
        id: data.id,
        user_id: data.user_id,
        target_calories: data.target_calories,
        target_protein: data.target_protein,
        target_carbs: data.target_carbs,
        target_fat: data.target_fat,
        is_active: data.is_active,
        created_at: data.created_at,
        variations: data.variations
            .into_iter()
            .map(|variation| DietVariation {
                id: variation.id,
                name: variation.name,
                meals: variation.meals
                    .into_iter()
                    .enumerate()
                    .map(|(order_index, meal)| Meal {
                        id: meal.id,
                        name: meal.name,
                        order_index,
                        items: meal.items.into_iter().map(convert_to_domain_meal_item).collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn convert_to_data_plan_request(domain: &CreateDietPlanRequest) -> data_plan::CreateDietPlanRequest {
    data_plan::CreateDietPlanRequest {
        user_id: domain.user_id.clone(),
        target_calories: domain.target_calories,
        target_protein: domain.target_protein,
        target_carbs: domain.target_carbs,
        target_fat: domain.target_fat,
        variations: domain.variations
            .iter()
            .map(|variation| data_plan::CreateDietVariation {
                name: variation.name.clone(),
                meals: variation.meals
                    .iter()
                    .map(|meal| data_plan::CreateMeal {
                        name: meal.name.clone(),
                        items: meal.items
                            .iter()
                            .map(convert_to_data_meal_item_request)
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn convert_to_domain_meal_item(data: data_plan::MealItem) -> MealItem {
    MealItem {
        id: data.id,
        quantity_grams: data.quantity_grams,
        food: convert_to_domain_food(data.food),
    }
}

pub fn convert_to_data_meal_item_request(domain: &CreateMealItem) -> data_plan::CreateMealItem {
    data_plan::CreateMealItem {
        food_item_id: domain.food_item_id.clone(),
        quantity_grams: domain.quantity_grams,
    }
}

pub fn convert_to_data_target_update(domain: &UpdateTargetsRequest) -> data_plan::TargetUpdate {
    data_plan::TargetUpdate {
        target_calories: domain.target_calories,
        target_protein: domain.target_protein,
        target_carbs: domain.target_carbs,
        target_fat: domain.target_fat,
    }
}

pub fn convert_to_domain_dismissal(data: data_dismissal::CoachDismissal) -> DismissalRecord {
    DismissalRecord {
        user_id: data.user_id,
        anchor: Anchor::new(data.w_curr, data.w_prev),
        applied: data.applied,
        recorded_at: data.recorded_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn test_body_log_round_trip_keeps_measurements() {
        let request = CreateBodyLogRequest {
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            weight_kg: 80.0,
            bio_body_fat_percent: Some(17.0),
            bio_muscle_mass_kg: Some(38.0),
            skinfolds: Skinfolds { triceps: Some(9.0), ..Skinfolds::default() },
            circumferences: Circumferences { waist: Some(83.0), ..Circumferences::default() },
        };

        let data_request = convert_to_data_body_log_request(&request, None, None);
        let stored = data_body_log::BodyLog::from_request("log-1".to_string(), data_request, Utc::now());
        let entry = convert_to_domain_body_log(stored);

        assert_eq!(entry.skinfolds, request.skinfolds);
        assert_eq!(entry.circumferences, request.circumferences);
        assert_eq!(entry.bio_muscle_mass_kg, Some(38.0));
        assert_eq!(entry.calculated_body_fat_percent, None);
    }

    #[test]
    fn test_food_request_trims_names() {
        let request = CreateFoodItemRequest {
            name: "  Oats ".to_string(),
            brand: Some("   ".to_string()),
            calories_kcal: 389.0,
            protein_g: 16.9,
            carbs_g: 66.3,
            fat_g: 6.9,
        };

        let data = convert_to_data_food_request(&request);
        assert_eq!(data.name, "Oats");
        assert_eq!(data.brand, None);
    }
}
