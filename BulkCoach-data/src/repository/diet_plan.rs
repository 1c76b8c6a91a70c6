use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::models::diet_plan::{
    AdjustmentOutcome, CoachAdjustment, CreateDietPlanRequest, CreateMealItem, DietPlan, DietVariation, Meal,
    MealItem, TargetUpdate,
};
use crate::models::food::FoodItem;
use super::backend::StorageBackend;
use super::errors::RepositoryError;
use super::storage::DatabaseStorage;

/// Repository trait for diet plans
#[async_trait]
pub trait DietPlanRepositoryTrait: Send + Sync {
    /// Store a plan as the active plan of its user; earlier plans become inactive
    async fn create(&self, request: CreateDietPlanRequest) -> Result<DietPlan, RepositoryError>;

    async fn get_active_plan(&self, user_id: &str) -> Result<Option<DietPlan>, RepositoryError>;

    /// Overwrite the targets set in `update`, refusing negative values
    async fn update_targets(&self, plan_id: &str, update: TargetUpdate) -> Result<DietPlan, RepositoryError>;

    /// Append an empty meal to the given variation, or to the first variation of the plan
    async fn add_meal(&self, plan_id: &str, variation_id: Option<&str>, name: &str) -> Result<Meal, RepositoryError>;

    async fn rename_meal(&self, meal_id: &str, name: &str) -> Result<Meal, RepositoryError>;

    /// Delete a meal and its items; false when there was no such meal
    async fn delete_meal(&self, meal_id: &str) -> Result<bool, RepositoryError>;

    /// Append an item to a meal. An unknown food is `NotFound`
    async fn add_meal_item(&self, meal_id: &str, item: CreateMealItem) -> Result<MealItem, RepositoryError>;

    async fn update_meal_item(&self, item_id: &str, quantity_grams: f64) -> Result<MealItem, RepositoryError>;

    async fn delete_meal_item(&self, item_id: &str) -> Result<bool, RepositoryError>;

    /// Atomically update the active plan and record the anchor as applied.
    ///
    /// Returns [`AdjustmentOutcome::AlreadyApplied`] without touching the plan when
    /// the stored anchor already matches an applied suggestion. A dismissed anchor
    /// does not block the apply.
    async fn apply_coach_adjustment(&self, user_id: &str, adjustment: CoachAdjustment) -> Result<AdjustmentOutcome, RepositoryError>;
}

#[derive(Debug, Clone)]
pub struct DietPlanRepository {
    backend: StorageBackend,
}

impl DietPlanRepository {
    pub fn new(backend: StorageBackend) -> Self {
        Self { backend }
    }

    async fn find_food(&self, id: &str) -> Result<Option<FoodItem>, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::get_food(pool, id).await,
            StorageBackend::InMemory(storage) => storage.get_food(id).await,
        }
    }

    /// Give every node an id and resolve the referenced foods
    async fn assemble(&self, request: CreateDietPlanRequest) -> Result<DietPlan, RepositoryError> {
        let mut variations = Vec::with_capacity(request.variations.len());

        for variation in request.variations {
            let mut meals = Vec::with_capacity(variation.meals.len());

            for meal in variation.meals {
                let mut items = Vec::with_capacity(meal.items.len());

                for item in meal.items {
                    let food = self.find_food(&item.food_item_id).await?
                        .ok_or_else(|| RepositoryError::Validation(
                            format!("unknown food item: {}", item.food_item_id),
                        ))?;
                    items.push(MealItem {
                        id: Uuid::new_v4().to_string(),
                        quantity_grams: item.quantity_grams,
                        food,
                    });
                }

                meals.push(Meal {
                    id: Uuid::new_v4().to_string(),
                    name: meal.name,
                    items,
                });
            }

            variations.push(DietVariation {
                id: Uuid::new_v4().to_string(),
                name: variation.name,
                meals,
            });
        }

        Ok(DietPlan {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            target_calories: request.target_calories,
            target_protein: request.target_protein,
            target_carbs: request.target_carbs,
            target_fat: request.target_fat,
            is_active: true,
            created_at: Utc::now(),
            variations,
        })
    }
}

#[async_trait]
impl DietPlanRepositoryTrait for DietPlanRepository {
    async fn create(&self, request: CreateDietPlanRequest) -> Result<DietPlan, RepositoryError> {
        let plan = self.assemble(request).await?;
        debug!("Creating diet plan {} for user {}", plan.id, plan.user_id);

        match &self.backend {
            StorageBackend::Database(pool) => {
                DatabaseStorage::insert_plan(pool, &plan).await?;
                Ok(plan)
            }
            StorageBackend::InMemory(storage) => storage.insert_plan(plan).await,
        }
    }

    async fn get_active_plan(&self, user_id: &str) -> Result<Option<DietPlan>, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::get_active_plan(pool, user_id).await,
            StorageBackend::InMemory(storage) => storage.get_active_plan(user_id).await,
        }
    }

    async fn update_targets(&self, plan_id: &str, update: TargetUpdate) -> Result<DietPlan, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::update_plan_targets(pool, plan_id, update).await,
            StorageBackend::InMemory(storage) => storage.update_plan_targets(plan_id, update).await,
        }
    }

    async fn add_meal(&self, plan_id: &str, variation_id: Option<&str>, name: &str) -> Result<Meal, RepositoryError> {
        let meal = Meal {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            items: Vec::new(),
        };
        debug!("Adding meal {} to diet plan {}", meal.id, plan_id);

        match &self.backend {
            StorageBackend::Database(pool) => {
                DatabaseStorage::insert_meal(pool, plan_id, variation_id, &meal).await?;
                Ok(meal)
            }
            StorageBackend::InMemory(storage) => storage.insert_meal(plan_id, variation_id, meal).await,
        }
    }

    async fn rename_meal(&self, meal_id: &str, name: &str) -> Result<Meal, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::rename_meal(pool, meal_id, name).await,
            StorageBackend::InMemory(storage) => storage.rename_meal(meal_id, name).await,
        }
    }

    async fn delete_meal(&self, meal_id: &str) -> Result<bool, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::delete_meal(pool, meal_id).await,
            StorageBackend::InMemory(storage) => storage.delete_meal(meal_id).await,
        }
    }

    async fn add_meal_item(&self, meal_id: &str, item: CreateMealItem) -> Result<MealItem, RepositoryError> {
        let food = self.find_food(&item.food_item_id).await?
            .ok_or_else(|| RepositoryError::NotFound(format!("food item {}", item.food_item_id)))?;
        let item = MealItem {
            id: Uuid::new_v4().to_string(),
            quantity_grams: item.quantity_grams,
            food,
        };
        debug!("Adding meal item {} to meal {}", item.id, meal_id);

        match &self.backend {
            StorageBackend::Database(pool) => {
                DatabaseStorage::insert_meal_item(pool, meal_id, &item).await?;
                Ok(item)
            }
            StorageBackend::InMemory(storage) => storage.insert_meal_item(meal_id, item).await,
        }
    }

    async fn update_meal_item(&self, item_id: &str, quantity_grams: f64) -> Result<MealItem, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::update_meal_item(pool, item_id, quantity_grams).await,
            StorageBackend::InMemory(storage) => storage.update_meal_item(item_id, quantity_grams).await,
        }
    }

    async fn delete_meal_item(&self, item_id: &str) -> Result<bool, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::delete_meal_item(pool, item_id).await,
            StorageBackend::InMemory(storage) => storage.delete_meal_item(item_id).await,
        }
    }

    async fn apply_coach_adjustment(&self, user_id: &str, adjustment: CoachAdjustment) -> Result<AdjustmentOutcome, RepositoryError> {
        let now = Utc::now();

        match &self.backend {
            StorageBackend::Database(pool) => {
                DatabaseStorage::apply_coach_adjustment(pool, user_id, adjustment, now).await
            }
            StorageBackend::InMemory(storage) => {
                storage.apply_coach_adjustment(user_id, adjustment, now).await
            }
        }
    }
}
