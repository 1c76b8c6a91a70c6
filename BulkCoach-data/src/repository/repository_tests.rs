use chrono::NaiveDate;

use crate::models::body_log::{Circumferences, CreateBodyLogRequest, Skinfolds};
use crate::models::diet_plan::{
    AdjustmentOutcome, CoachAdjustment, CreateDietPlanRequest, CreateDietVariation, CreateMeal, CreateMealItem,
    TargetUpdate,
};
use crate::models::food::CreateFoodItemRequest;
use super::*;

fn backends() -> Vec<StorageBackend> {
    vec![
        StorageBackend::in_memory(),
        StorageBackend::sqlite_in_memory().expect("in-memory sqlite"),
    ]
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn log_request(user: &str, date: NaiveDate, weight: f64) -> CreateBodyLogRequest {
    CreateBodyLogRequest {
        user_id: user.to_string(),
        date,
        weight_kg: weight,
        bio_body_fat_percent: None,
        bio_muscle_mass_kg: None,
        skinfolds: Skinfolds::default(),
        circumferences: Circumferences {
            waist: Some(82.0),
            ..Circumferences::default()
        },
        calculated_body_density: None,
        calculated_body_fat_percent: None,
    }
}

fn rice() -> CreateFoodItemRequest {
    CreateFoodItemRequest {
        name: "Rice, cooked".to_string(),
        brand: None,
        calories_kcal: 130.0,
        protein_g: 2.7,
        carbs_g: 28.0,
        fat_g: 0.3,
    }
}

fn plan_request(user: &str, food_id: &str, calories: f64, carbs: f64) -> CreateDietPlanRequest {
    CreateDietPlanRequest {
        user_id: user.to_string(),
        target_calories: calories,
        target_protein: 160.0,
        target_carbs: carbs,
        target_fat: 70.0,
        variations: vec![CreateDietVariation {
            name: "Training day".to_string(),
            meals: vec![CreateMeal {
                name: "Lunch".to_string(),
                items: vec![CreateMealItem {
                    food_item_id: food_id.to_string(),
                    quantity_grams: 250.0,
                }],
            }],
        }],
    }
}

fn adjustment(calorie_delta: f64, carb_delta: f64) -> CoachAdjustment {
    CoachAdjustment {
        calorie_delta,
        carb_delta,
        w_curr: 80.2,
        w_prev: 80.1,
    }
}

#[tokio::test]
async fn test_body_log_one_per_day() {
    for backend in backends() {
        let repo = BodyLogRepository::new(backend.clone());

        repo.create(log_request("u1", day(1), 80.0)).await.unwrap();
        let duplicate = repo.create(log_request("u1", day(1), 81.0)).await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))), "{}", backend.describe());

        // Another user may log the same day
        repo.create(log_request("u2", day(1), 70.0)).await.unwrap();
    }
}

#[tokio::test]
async fn test_body_log_update_and_delete() {
    for backend in backends() {
        let repo = BodyLogRepository::new(backend.clone());
        let created = repo.create(log_request("u1", day(2), 80.0)).await.unwrap();

        let updated = repo.update("u1", day(2), log_request("u1", day(2), 80.6)).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.weight_kg, 80.6);
        assert_eq!(updated.circumferences.waist, Some(82.0));

        let missing = repo.update("u1", day(9), log_request("u1", day(9), 80.0)).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));

        assert!(repo.delete("u1", day(2)).await.unwrap());
        assert!(!repo.delete("u1", day(2)).await.unwrap());
        assert!(repo.get_by_date("u1", day(2)).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_body_log_update_cannot_move_onto_taken_day() {
    for backend in backends() {
        let repo = BodyLogRepository::new(backend.clone());
        repo.create(log_request("u1", day(3), 80.0)).await.unwrap();
        repo.create(log_request("u1", day(4), 80.2)).await.unwrap();

        let moved = repo.update("u1", day(3), log_request("u1", day(4), 80.1)).await;
        assert!(matches!(moved, Err(RepositoryError::Conflict(_))), "{}", backend.describe());
    }
}

#[tokio::test]
async fn test_body_log_listing_order_and_bounds() {
    for backend in backends() {
        let repo = BodyLogRepository::new(backend.clone());
        for (d, w) in [(5, 80.5), (1, 80.1), (3, 80.3), (10, 81.0)] {
            repo.create(log_request("u1", day(d), w)).await.unwrap();
        }
        repo.create(log_request("other", day(3), 60.0)).await.unwrap();

        let window = repo.list_between("u1", day(1), day(5)).await.unwrap();
        let dates: Vec<NaiveDate> = window.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![day(1), day(3), day(5)]);

        let all = repo.list("u1").await.unwrap();
        let dates: Vec<NaiveDate> = all.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![day(10), day(5), day(3), day(1)]);
    }
}

#[tokio::test]
async fn test_food_search_and_cascade() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());

        let rice = foods.create(rice()).await.unwrap();
        foods.create(CreateFoodItemRequest {
            name: "Oats".to_string(),
            brand: Some("Acme".to_string()),
            calories_kcal: 389.0,
            protein_g: 16.9,
            carbs_g: 66.3,
            fat_g: 6.9,
        }).await.unwrap();

        let found = foods.list(Some("RICE".to_string())).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, rice.id);
        assert_eq!(foods.list(None).await.unwrap().len(), 2);

        plans.create(plan_request("u1", &rice.id, 3000.0, 350.0)).await.unwrap();
        assert!(foods.delete(&rice.id).await.unwrap());

        let plan = plans.get_active_plan("u1").await.unwrap().unwrap();
        assert!(plan.variations[0].meals[0].items.is_empty(), "{}", backend.describe());
    }
}

#[tokio::test]
async fn test_plan_creation_rejects_unknown_food() {
    for backend in backends() {
        let plans = DietPlanRepository::new(backend);
        let result = plans.create(plan_request("u1", "missing", 3000.0, 350.0)).await;
        assert!(matches!(result, Err(RepositoryError::Validation(_))));
    }
}

#[tokio::test]
async fn test_new_plan_replaces_active_plan() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());
        let rice = foods.create(rice()).await.unwrap();

        let first = plans.create(plan_request("u1", &rice.id, 2800.0, 300.0)).await.unwrap();
        let second = plans.create(plan_request("u1", &rice.id, 3000.0, 350.0)).await.unwrap();
        assert_ne!(first.id, second.id);

        let active = plans.get_active_plan("u1").await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(active.variations.len(), 1);
        assert_eq!(active.variations[0].meals[0].items[0].food.name, "Rice, cooked");
        assert_eq!(active.variations[0].meals[0].items[0].quantity_grams, 250.0);
    }
}

#[tokio::test]
async fn test_apply_coach_adjustment_is_idempotent() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());
        let dismissals = DismissalRepository::new(backend.clone());
        let rice = foods.create(rice()).await.unwrap();
        plans.create(plan_request("u1", &rice.id, 3000.0, 350.0)).await.unwrap();

        let first = plans.apply_coach_adjustment("u1", adjustment(160.4, 40.1)).await.unwrap();
        assert!(matches!(first, AdjustmentOutcome::Applied(_)));
        assert!((first.plan().target_calories - 3160.4).abs() < 1e-9);
        assert!((first.plan().target_carbs - 390.1).abs() < 1e-9);

        let second = plans.apply_coach_adjustment("u1", adjustment(160.4, 40.1)).await.unwrap();
        assert!(matches!(second, AdjustmentOutcome::AlreadyApplied(_)));
        assert!((second.plan().target_calories - 3160.4).abs() < 1e-9);

        let record = dismissals.get("u1").await.unwrap().unwrap();
        assert!(record.applied);
        assert!(record.matches(80.2, 80.1));
    }
}

#[tokio::test]
async fn test_apply_coach_adjustment_refuses_negative_targets() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());
        let dismissals = DismissalRepository::new(backend.clone());
        let rice = foods.create(rice()).await.unwrap();
        plans.create(plan_request("u1", &rice.id, 100.0, 10.0)).await.unwrap();

        let result = plans.apply_coach_adjustment("u1", adjustment(-160.4, -40.1)).await;
        assert!(matches!(result, Err(RepositoryError::Validation(_))));

        let plan = plans.get_active_plan("u1").await.unwrap().unwrap();
        assert_eq!(plan.target_calories, 100.0);
        assert!(dismissals.get("u1").await.unwrap().is_none(), "{}", backend.describe());
    }
}

#[tokio::test]
async fn test_apply_coach_adjustment_without_plan() {
    for backend in backends() {
        let plans = DietPlanRepository::new(backend);
        let result = plans.apply_coach_adjustment("nobody", adjustment(100.0, 25.0)).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}

#[tokio::test]
async fn test_update_targets() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());
        let rice = foods.create(rice()).await.unwrap();
        let plan = plans.create(plan_request("u1", &rice.id, 3000.0, 350.0)).await.unwrap();

        let update = TargetUpdate {
            target_calories: Some(2800.0),
            target_fat: Some(65.0),
            ..TargetUpdate::default()
        };
        let updated = plans.update_targets(&plan.id, update).await.unwrap();
        assert_eq!(updated.target_calories, 2800.0);
        assert_eq!(updated.target_carbs, 350.0);
        assert_eq!(updated.target_fat, 65.0);

        let negative = TargetUpdate {
            target_carbs: Some(-1.0),
            ..TargetUpdate::default()
        };
        let result = plans.update_targets(&plan.id, negative).await;
        assert!(matches!(result, Err(RepositoryError::Validation(_))));

        let stored = plans.get_active_plan("u1").await.unwrap().unwrap();
        assert_eq!(stored.target_calories, 2800.0);
        assert_eq!(stored.target_carbs, 350.0);

        let missing = plans.update_targets("missing", TargetUpdate::default()).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }
}

#[tokio::test]
async fn test_meal_editing() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());
        let rice = foods.create(rice()).await.unwrap();
        let plan = plans.create(plan_request("u1", &rice.id, 3000.0, 350.0)).await.unwrap();

        let dinner = plans.add_meal(&plan.id, None, "Dinner").await.unwrap();
        assert!(dinner.items.is_empty());

        let item = plans.add_meal_item(&dinner.id, CreateMealItem {
            food_item_id: rice.id.clone(),
            quantity_grams: 100.0,
        }).await.unwrap();
        assert_eq!(item.food.id, rice.id);

        let renamed = plans.rename_meal(&dinner.id, "Late dinner").await.unwrap();
        assert_eq!(renamed.name, "Late dinner");
        assert_eq!(renamed.items.len(), 1);

        let resized = plans.update_meal_item(&item.id, 180.0).await.unwrap();
        assert_eq!(resized.quantity_grams, 180.0);

        let stored = plans.get_active_plan("u1").await.unwrap().unwrap();
        let meals = &stored.variations[0].meals;
        assert_eq!(meals.len(), 2, "{}", backend.describe());
        assert_eq!(meals[1].name, "Late dinner");
        assert_eq!(meals[1].items[0].quantity_grams, 180.0);

        assert!(plans.delete_meal_item(&item.id).await.unwrap());
        assert!(!plans.delete_meal_item(&item.id).await.unwrap());
        assert!(plans.delete_meal(&dinner.id).await.unwrap());
        assert!(!plans.delete_meal(&dinner.id).await.unwrap());

        let stored = plans.get_active_plan("u1").await.unwrap().unwrap();
        assert_eq!(stored.variations[0].meals.len(), 1);
    }
}

#[tokio::test]
async fn test_meal_editing_unknown_targets() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());
        let rice = foods.create(rice()).await.unwrap();
        let plan = plans.create(plan_request("u1", &rice.id, 3000.0, 350.0)).await.unwrap();
        let lunch_id = plan.variations[0].meals[0].id.clone();

        assert!(matches!(plans.add_meal("missing", None, "Dinner").await, Err(RepositoryError::NotFound(_))));
        assert!(matches!(
            plans.add_meal(&plan.id, Some("missing"), "Dinner").await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(plans.rename_meal("missing", "x").await, Err(RepositoryError::NotFound(_))));
        assert!(matches!(plans.update_meal_item("missing", 10.0).await, Err(RepositoryError::NotFound(_))));

        let unknown_food = plans.add_meal_item(&lunch_id, CreateMealItem {
            food_item_id: "missing".to_string(),
            quantity_grams: 10.0,
        }).await;
        assert!(matches!(unknown_food, Err(RepositoryError::NotFound(_))));

        let unknown_meal = plans.add_meal_item("missing", CreateMealItem {
            food_item_id: rice.id.clone(),
            quantity_grams: 10.0,
        }).await;
        assert!(matches!(unknown_meal, Err(RepositoryError::NotFound(_))));
    }
}

#[tokio::test]
async fn test_dismissed_anchor_can_still_be_applied() {
    for backend in backends() {
        let foods = FoodRepository::new(backend.clone());
        let plans = DietPlanRepository::new(backend.clone());
        let dismissals = DismissalRepository::new(backend.clone());
        let rice = foods.create(rice()).await.unwrap();
        plans.create(plan_request("u1", &rice.id, 3000.0, 350.0)).await.unwrap();

        dismissals.put("u1", 80.2, 80.1, false).await.unwrap();

        let outcome = plans.apply_coach_adjustment("u1", adjustment(160.0, 40.0)).await.unwrap();
        assert!(matches!(outcome, AdjustmentOutcome::Applied(_)), "{}", backend.describe());
        assert_eq!(outcome.plan().target_calories, 3160.0);

        let record = dismissals.get("u1").await.unwrap().unwrap();
        assert!(record.applied);
    }
}

#[tokio::test]
async fn test_dismissal_record_replaces_previous() {
    for backend in backends() {
        let dismissals = DismissalRepository::new(backend);
        assert!(dismissals.get("u1").await.unwrap().is_none());

        dismissals.put("u1", 80.0, 79.8, false).await.unwrap();
        dismissals.put("u1", 80.4, 80.0, false).await.unwrap();

        let record = dismissals.get("u1").await.unwrap().unwrap();
        assert!(record.matches(80.4, 80.0));
        assert!(!record.applied);
    }
}

#[tokio::test]
async fn test_mock_repository_failure() {
    let repo = tests::MockBodyLogRepository::failing();
    let result = repo.list("u1").await;
    assert!(matches!(result, Err(RepositoryError::Database(_))));
}

#[tokio::test]
async fn test_list_recent_window_is_inclusive() {
    let repo = BodyLogRepository::new(StorageBackend::in_memory());
    for d in [1, 2, 15, 16, 17] {
        repo.create(log_request("u1", day(d), 80.0)).await.unwrap();
    }

    // 14 days ending on the 16th: the 3rd through the 16th
    let recent = repo.list_recent("u1", 14, day(16)).await.unwrap();
    let dates: Vec<NaiveDate> = recent.iter().map(|l| l.date).collect();
    assert_eq!(dates, vec![day(15), day(16)]);

    let recent = repo.list_recent("u1", 14, day(14)).await.unwrap();
    let dates: Vec<NaiveDate> = recent.iter().map(|l| l.date).collect();
    assert_eq!(dates, vec![day(1), day(2)]);
}
