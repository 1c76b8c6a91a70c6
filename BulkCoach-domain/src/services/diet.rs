use thiserror::Error;
use tracing::{error, info};
use validator::Validate;
use async_trait::async_trait;

use bulk_coach_data::models::diet_plan::Meal as DataMeal;
use bulk_coach_data::repository::{
    DietPlanRepository, DietPlanRepositoryTrait, FoodRepository, FoodRepositoryTrait, RepositoryError, StorageBackend,
};

use crate::entities::coaching::round1;
use crate::entities::conversions;
use crate::entities::diet::{
    CreateDietPlanRequest, CreateDietVariation, CreateFoodItemRequest, CreateMealItem, CreateMealRequest, DietPlan,
    DietPlanDetails, DietVariation, FoodItem, MacroComparison, MacroComparisons, Meal, MealDetails, MealItem,
    MealItemDetails, MealSummary, NutrientTotals, RenameMealRequest, UpdateMealItemRequest, UpdateTargetsRequest,
    VariationSummary,
};
use crate::services::validation_message;

/// Name of the variation created for plans submitted without one
pub const DEFAULT_VARIATION_NAME: &str = "Principal";

/// Diet service errors
#[derive(Debug, Error)]
pub enum DietServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Nutrients of one item: per-100 g values scaled by its quantity
pub fn item_totals(item: &MealItem) -> NutrientTotals {
    let scale = |per_100g: f64| per_100g * item.quantity_grams / 100.0;
    NutrientTotals {
        calories_kcal: scale(item.food.calories_kcal),
        protein_g: scale(item.food.protein_g),
        carbs_g: scale(item.food.carbs_g),
        fat_g: scale(item.food.fat_g),
    }
}

pub fn meal_totals(meal: &Meal) -> NutrientTotals {
    meal.items.iter().map(item_totals).sum()
}

pub fn variation_totals(variation: &DietVariation) -> NutrientTotals {
    variation.meals.iter().map(meal_totals).sum()
}

/// Compare an actual amount with its target; the percentage is 0 for a zero target
pub fn compare(target: f64, actual: f64) -> MacroComparison {
    let percentage = if target == 0.0 {
        0.0
    } else {
        round1(actual * 100.0 / target)
    };

    MacroComparison {
        target,
        actual,
        difference: actual - target,
        percentage,
    }
}

/// Derive the per-meal and per-variation figures of a plan
pub fn summarize_plan(plan: DietPlan) -> DietPlanDetails {
    let variations = plan
        .variations
        .iter()
        .map(|variation| {
            let meals: Vec<MealSummary> = variation
                .meals
                .iter()
                .map(|meal| MealSummary {
                    meal_id: meal.id.clone(),
                    name: meal.name.clone(),
                    totals: meal_totals(meal),
                })
                .collect();
            let totals: NutrientTotals = meals.iter().map(|m| m.totals).sum();

            VariationSummary {
                variation_id: variation.id.clone(),
                name: variation.name.clone(),
                meals,
                totals,
                comparison: MacroComparisons {
                    calories: compare(plan.target_calories, totals.calories_kcal),
                    protein: compare(plan.target_protein, totals.protein_g),
                    carbs: compare(plan.target_carbs, totals.carbs_g),
                    fat: compare(plan.target_fat, totals.fat_g),
                },
            }
        })
        .collect();

    DietPlanDetails { plan, variations }
}

fn meal_details(meal: DataMeal) -> MealDetails {
    let items: Vec<MealItem> = meal.items.into_iter().map(conversions::convert_to_domain_meal_item).collect();
    let totals = items.iter().map(item_totals).sum();

    MealDetails {
        meal_id: meal.id,
        name: meal.name,
        items,
        totals,
    }
}

fn item_details(item: MealItem) -> MealItemDetails {
    let totals = item_totals(&item);
    MealItemDetails { item, totals }
}

/// Trimmed meal name, blank names are refused
fn meal_name(name: &str) -> Result<String, DietServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DietServiceError::ValidationError("name: Meal name cannot be blank".to_string()));
    }
    Ok(name.to_string())
}

/// Trait for food catalogue and diet plan operations
#[async_trait]
pub trait DietServiceTrait: Send + Sync {
    async fn create_food(&self, request: CreateFoodItemRequest) -> Result<FoodItem, DietServiceError>;

    async fn get_food(&self, id: &str) -> Result<FoodItem, DietServiceError>;

    async fn list_foods(&self, search: Option<String>) -> Result<Vec<FoodItem>, DietServiceError>;

    /// Delete a food; meal items using it are removed as well
    async fn delete_food(&self, id: &str) -> Result<(), DietServiceError>;

    /// Create a plan and make it the user's active plan
    async fn create_plan(&self, request: CreateDietPlanRequest) -> Result<DietPlanDetails, DietServiceError>;

    /// The active plan with its derived totals
    async fn get_current_plan(&self, user_id: &str) -> Result<DietPlanDetails, DietServiceError>;

    /// Overwrite the targets present in the request
    async fn update_targets(&self, plan_id: &str, request: UpdateTargetsRequest) -> Result<DietPlanDetails, DietServiceError>;

    async fn add_meal(&self, plan_id: &str, request: CreateMealRequest) -> Result<MealDetails, DietServiceError>;

    async fn rename_meal(&self, meal_id: &str, request: RenameMealRequest) -> Result<MealDetails, DietServiceError>;

    async fn delete_meal(&self, meal_id: &str) -> Result<(), DietServiceError>;

    async fn add_meal_item(&self, meal_id: &str, request: CreateMealItem) -> Result<MealItemDetails, DietServiceError>;

    /// Change the quantity of an item
    async fn update_meal_item(&self, item_id: &str, request: UpdateMealItemRequest) -> Result<MealItemDetails, DietServiceError>;

    async fn delete_meal_item(&self, item_id: &str) -> Result<(), DietServiceError>;
}

/// Diet service over the food and plan repositories
pub struct DietService<F: FoodRepositoryTrait, P: DietPlanRepositoryTrait> {
    foods: F,
    plans: P,
}

impl<F: FoodRepositoryTrait, P: DietPlanRepositoryTrait> DietService<F, P> {
    pub fn new(foods: F, plans: P) -> Self {
        Self { foods, plans }
    }

    fn map_repo_error(&self, err: RepositoryError) -> DietServiceError {
        match err {
            RepositoryError::NotFound(msg) => DietServiceError::NotFound(msg),
            RepositoryError::Validation(msg) | RepositoryError::Conflict(msg) => DietServiceError::ValidationError(msg),
            _ => {
                error!("Diet storage failure: {}", err);
                DietServiceError::RepositoryError(err.to_string())
            }
        }
    }
}

#[async_trait]
impl<F: FoodRepositoryTrait, P: DietPlanRepositoryTrait> DietServiceTrait for DietService<F, P> {
    async fn create_food(&self, request: CreateFoodItemRequest) -> Result<FoodItem, DietServiceError> {
        request.validate().map_err(|e| DietServiceError::ValidationError(validation_message(&e)))?;
        if request.name.trim().is_empty() {
            return Err(DietServiceError::ValidationError("name: Name cannot be blank".to_string()));
        }

        let food = self.foods
            .create(conversions::convert_to_data_food_request(&request))
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(food_id = %food.id, name = %food.name, "Food added to catalogue");
        Ok(conversions::convert_to_domain_food(food))
    }

    async fn get_food(&self, id: &str) -> Result<FoodItem, DietServiceError> {
        self.foods
            .get_by_id(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_food)
            .ok_or_else(|| DietServiceError::NotFound(format!("food {} not found", id)))
    }

    async fn list_foods(&self, search: Option<String>) -> Result<Vec<FoodItem>, DietServiceError> {
        let foods = self.foods
            .list(search)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(foods.into_iter().map(conversions::convert_to_domain_food).collect())
    }

    async fn delete_food(&self, id: &str) -> Result<(), DietServiceError> {
        let deleted = self.foods
            .delete(id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if !deleted {
            return Err(DietServiceError::NotFound(format!("food {} not found", id)));
        }

        info!(food_id = id, "Food deleted");
        Ok(())
    }

    async fn create_plan(&self, mut request: CreateDietPlanRequest) -> Result<DietPlanDetails, DietServiceError> {
        request.validate().map_err(|e| DietServiceError::ValidationError(validation_message(&e)))?;

        if request.variations.is_empty() {
            request.variations.push(CreateDietVariation {
                name: DEFAULT_VARIATION_NAME.to_string(),
                meals: Vec::new(),
            });
        }

        let plan = self.plans
            .create(conversions::convert_to_data_plan_request(&request))
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(
            user_id = %plan.user_id,
            plan_id = %plan.id,
            target_calories = plan.target_calories,
            "Diet plan created and activated"
        );

        Ok(summarize_plan(conversions::convert_to_domain_plan(plan)))
    }

    async fn get_current_plan(&self, user_id: &str) -> Result<DietPlanDetails, DietServiceError> {
        let plan = self.plans
            .get_active_plan(user_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| DietServiceError::NotFound(format!("no active diet plan for user {}", user_id)))?;

        Ok(summarize_plan(conversions::convert_to_domain_plan(plan)))
    }

    async fn update_targets(&self, plan_id: &str, request: UpdateTargetsRequest) -> Result<DietPlanDetails, DietServiceError> {
        request.validate().map_err(|e| DietServiceError::ValidationError(validation_message(&e)))?;

        let plan = self.plans
            .update_targets(plan_id, conversions::convert_to_data_target_update(&request))
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(
            plan_id,
            target_calories = plan.target_calories,
            target_protein = plan.target_protein,
            target_carbs = plan.target_carbs,
            target_fat = plan.target_fat,
            "Diet plan targets updated"
        );

        Ok(summarize_plan(conversions::convert_to_domain_plan(plan)))
    }

    async fn add_meal(&self, plan_id: &str, request: CreateMealRequest) -> Result<MealDetails, DietServiceError> {
        request.validate().map_err(|e| DietServiceError::ValidationError(validation_message(&e)))?;
        let name = meal_name(&request.name)?;

        let meal = self.plans
            .add_meal(plan_id, request.variation_id.as_deref(), &name)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(plan_id, meal_id = %meal.id, name = %meal.name, "Meal added to diet plan");
        Ok(meal_details(meal))
    }

    async fn rename_meal(&self, meal_id: &str, request: RenameMealRequest) -> Result<MealDetails, DietServiceError> {
        request.validate().map_err(|e| DietServiceError::ValidationError(validation_message(&e)))?;
        let name = meal_name(&request.name)?;

        let meal = self.plans
            .rename_meal(meal_id, &name)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(meal_id, name = %meal.name, "Meal renamed");
        Ok(meal_details(meal))
    }

    async fn delete_meal(&self, meal_id: &str) -> Result<(), DietServiceError> {
        let deleted = self.plans
            .delete_meal(meal_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if !deleted {
            return Err(DietServiceError::NotFound(format!("meal {} not found", meal_id)));
        }

        info!(meal_id, "Meal deleted with its items");
        Ok(())
    }

    async fn add_meal_item(&self, meal_id: &str, request: CreateMealItem) -> Result<MealItemDetails, DietServiceError> {
        request.validate().map_err(|e| DietServiceError::ValidationError(validation_message(&e)))?;

        let item = self.plans
            .add_meal_item(meal_id, conversions::convert_to_data_meal_item_request(&request))
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(meal_id, item_id = %item.id, quantity_grams = item.quantity_grams, "Item added to meal");
        Ok(item_details(conversions::convert_to_domain_meal_item(item)))
    }

    async fn update_meal_item(&self, item_id: &str, request: UpdateMealItemRequest) -> Result<MealItemDetails, DietServiceError> {
        request.validate().map_err(|e| DietServiceError::ValidationError(validation_message(&e)))?;

        let item = self.plans
            .update_meal_item(item_id, request.quantity_grams)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(item_id, quantity_grams = item.quantity_grams, "Meal item quantity changed");
        Ok(item_details(conversions::convert_to_domain_meal_item(item)))
    }

    async fn delete_meal_item(&self, item_id: &str) -> Result<(), DietServiceError> {
        let deleted = self.plans
            .delete_meal_item(item_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if !deleted {
            return Err(DietServiceError::NotFound(format!("meal item {} not found", item_id)));
        }

        info!(item_id, "Meal item removed");
        Ok(())
    }
}

/// Create the diet service over a shared storage backend
pub fn create_default_diet_service(backend: StorageBackend) -> DietService<FoodRepository, DietPlanRepository> {
    DietService::new(FoodRepository::new(backend.clone()), DietPlanRepository::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::diet::CreateMeal;
    use crate::testing::fixtures::{food_request, sample_plan};

    fn service() -> DietService<FoodRepository, DietPlanRepository> {
        create_default_diet_service(StorageBackend::in_memory())
    }

    fn plan_request(user_id: &str, food_id: &str, grams: f64) -> CreateDietPlanRequest {
        CreateDietPlanRequest {
            user_id: user_id.to_string(),
            target_calories: 3000.0,
            target_protein: 150.0,
            target_carbs: 400.0,
            target_fat: 80.0,
            variations: vec![CreateDietVariation {
                name: "Training day".to_string(),
                meals: vec![
                    CreateMeal {
                        name: "Breakfast".to_string(),
                        items: vec![CreateMealItem {
                            food_item_id: food_id.to_string(),
                            quantity_grams: grams,
                        }],
                    },
                    CreateMeal {
                        name: "Lunch".to_string(),
                        items: vec![CreateMealItem {
                            food_item_id: food_id.to_string(),
                            quantity_grams: grams,
                        }],
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_item_totals_scale_per_100g() {
        let plan = sample_plan(3000.0, 400.0);
        let item = &plan.variations[0].meals[0].items[0];
        let totals = item_totals(item);

        // 150 g of a 200 kcal / 10 P / 30 C / 5 F food
        assert_eq!(totals.calories_kcal, 300.0);
        assert_eq!(totals.protein_g, 15.0);
        assert_eq!(totals.carbs_g, 45.0);
        assert_eq!(totals.fat_g, 7.5);
    }

    #[test]
    fn test_compare_handles_zero_target() {
        let comparison = compare(0.0, 50.0);
        assert_eq!(comparison.percentage, 0.0);
        assert_eq!(comparison.difference, 50.0);

        let comparison = compare(3000.0, 600.0);
        assert_eq!(comparison.percentage, 20.0);
        assert_eq!(comparison.difference, -2400.0);
    }

    #[test]
    fn test_summarize_plan_sums_meals() {
        let details = summarize_plan(sample_plan(3000.0, 400.0));
        let variation = &details.variations[0];

        assert_eq!(variation.meals.len(), 1);
        assert_eq!(variation.totals.calories_kcal, 300.0);
        assert_eq!(variation.comparison.carbs.target, 400.0);
        assert_eq!(variation.comparison.carbs.actual, 45.0);
    }

    #[tokio::test]
    async fn test_create_plan_and_read_current() {
        let service = service();
        let food = service.create_food(food_request()).await.unwrap();

        service.create_plan(plan_request("user-1", &food.id, 150.0)).await.unwrap();
        let details = service.get_current_plan("user-1").await.unwrap();

        assert!(details.plan.is_active);
        assert_eq!(details.plan.variations[0].meals[1].order_index, 1);
        let totals = details.variations[0].totals;
        assert_eq!(totals.calories_kcal, 600.0);
        assert_eq!(totals.protein_g, 30.0);
        assert_eq!(totals.carbs_g, 90.0);
        assert_eq!(totals.fat_g, 15.0);
        assert_eq!(details.variations[0].comparison.calories.percentage, 20.0);
    }

    #[tokio::test]
    async fn test_plan_without_variations_gets_default() {
        let service = service();
        let mut request = plan_request("user-1", "unused", 100.0);
        request.variations.clear();

        let details = service.create_plan(request).await.unwrap();
        assert_eq!(details.plan.variations.len(), 1);
        assert_eq!(details.plan.variations[0].name, DEFAULT_VARIATION_NAME);
        assert_eq!(details.variations[0].totals, NutrientTotals::default());
    }

    #[tokio::test]
    async fn test_unknown_food_is_rejected() {
        let service = service();
        let result = service.create_plan(plan_request("user-1", "missing", 100.0)).await;
        assert!(matches!(result, Err(DietServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_no_active_plan() {
        let result = service().get_current_plan("nobody").await;
        assert!(matches!(result, Err(DietServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_food_lifecycle() {
        let service = service();
        let food = service.create_food(food_request()).await.unwrap();

        assert_eq!(service.get_food(&food.id).await.unwrap().name, food.name);
        assert_eq!(service.list_foods(Some("test".to_string())).await.unwrap().len(), 1);
        assert!(service.list_foods(Some("zzz".to_string())).await.unwrap().is_empty());

        service.delete_food(&food.id).await.unwrap();
        assert!(matches!(service.get_food(&food.id).await, Err(DietServiceError::NotFound(_))));
        assert!(matches!(service.delete_food(&food.id).await, Err(DietServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_food_is_rejected() {
        let service = service();
        let mut request = food_request();
        request.protein_g = 150.0;
        assert!(matches!(service.create_food(request).await, Err(DietServiceError::ValidationError(_))));

        let mut request = food_request();
        request.name = "   ".to_string();
        assert!(matches!(service.create_food(request).await, Err(DietServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_editing_item_quantity_changes_totals() {
        let service = service();
        let food = service.create_food(food_request()).await.unwrap();
        let created = service.create_plan(plan_request("user-1", &food.id, 150.0)).await.unwrap();
        let item_id = created.plan.variations[0].meals[0].items[0].id.clone();
        assert_eq!(created.variations[0].totals.calories_kcal, 600.0);

        let edited = service
            .update_meal_item(&item_id, UpdateMealItemRequest { quantity_grams: 300.0 })
            .await
            .unwrap();
        assert_eq!(edited.item.quantity_grams, 300.0);
        assert_eq!(edited.totals.calories_kcal, 600.0);
        assert_eq!(edited.totals.carbs_g, 90.0);

        // Breakfast now 300 g, lunch still 150 g
        let details = service.get_current_plan("user-1").await.unwrap();
        assert_eq!(details.variations[0].meals[0].totals.calories_kcal, 600.0);
        assert_eq!(details.variations[0].totals.calories_kcal, 900.0);
        assert_eq!(details.variations[0].comparison.calories.percentage, 30.0);
    }

    #[tokio::test]
    async fn test_meal_lifecycle() {
        let service = service();
        let food = service.create_food(food_request()).await.unwrap();
        let created = service.create_plan(plan_request("user-1", &food.id, 150.0)).await.unwrap();
        let plan_id = created.plan.id.clone();

        let snack = service
            .add_meal(&plan_id, CreateMealRequest { name: "  Snack ".to_string(), variation_id: None })
            .await
            .unwrap();
        assert_eq!(snack.name, "Snack");
        assert_eq!(snack.totals, NutrientTotals::default());

        let added = service
            .add_meal_item(&snack.meal_id, CreateMealItem { food_item_id: food.id.clone(), quantity_grams: 50.0 })
            .await
            .unwrap();
        assert_eq!(added.totals.calories_kcal, 100.0);

        let renamed = service
            .rename_meal(&snack.meal_id, RenameMealRequest { name: "Evening snack".to_string() })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Evening snack");
        assert_eq!(renamed.totals.calories_kcal, 100.0);

        let details = service.get_current_plan("user-1").await.unwrap();
        assert_eq!(details.variations[0].meals.len(), 3);
        assert_eq!(details.variations[0].totals.calories_kcal, 700.0);

        service.delete_meal_item(&added.item.id).await.unwrap();
        assert!(matches!(service.delete_meal_item(&added.item.id).await, Err(DietServiceError::NotFound(_))));
        service.delete_meal(&snack.meal_id).await.unwrap();
        assert!(matches!(service.delete_meal(&snack.meal_id).await, Err(DietServiceError::NotFound(_))));

        let details = service.get_current_plan("user-1").await.unwrap();
        assert_eq!(details.variations[0].meals.len(), 2);
        assert_eq!(details.variations[0].totals.calories_kcal, 600.0);
    }

    #[tokio::test]
    async fn test_meal_edits_are_validated() {
        let service = service();
        let food = service.create_food(food_request()).await.unwrap();
        let created = service.create_plan(plan_request("user-1", &food.id, 150.0)).await.unwrap();
        let meal_id = created.plan.variations[0].meals[0].id.clone();
        let item_id = created.plan.variations[0].meals[0].items[0].id.clone();

        let blank = service.rename_meal(&meal_id, RenameMealRequest { name: "   ".to_string() }).await;
        assert!(matches!(blank, Err(DietServiceError::ValidationError(_))));

        let zero = service.update_meal_item(&item_id, UpdateMealItemRequest { quantity_grams: 0.0 }).await;
        assert!(matches!(zero, Err(DietServiceError::ValidationError(_))));

        let unknown_food = service
            .add_meal_item(&meal_id, CreateMealItem { food_item_id: "missing".to_string(), quantity_grams: 10.0 })
            .await;
        assert!(matches!(unknown_food, Err(DietServiceError::NotFound(_))));

        let unknown_plan = service
            .add_meal("missing", CreateMealRequest { name: "Snack".to_string(), variation_id: None })
            .await;
        assert!(matches!(unknown_plan, Err(DietServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_targets_keeps_unset_fields() {
        let service = service();
        let food = service.create_food(food_request()).await.unwrap();
        let created = service.create_plan(plan_request("user-1", &food.id, 150.0)).await.unwrap();

        let request = UpdateTargetsRequest {
            target_calories: Some(2000.0),
            ..UpdateTargetsRequest::default()
        };
        let details = service.update_targets(&created.plan.id, request).await.unwrap();
        assert_eq!(details.plan.target_calories, 2000.0);
        assert_eq!(details.plan.target_carbs, 400.0);
        assert_eq!(details.variations[0].comparison.calories.percentage, 30.0);

        let negative = UpdateTargetsRequest {
            target_fat: Some(-5.0),
            ..UpdateTargetsRequest::default()
        };
        assert!(matches!(
            service.update_targets(&created.plan.id, negative).await,
            Err(DietServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service.update_targets("missing", UpdateTargetsRequest::default()).await,
            Err(DietServiceError::NotFound(_))
        ));
    }
}
