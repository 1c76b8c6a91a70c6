use std::sync::{Arc, Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::body_log::{BodyLog, CreateBodyLogRequest};
use crate::models::diet_plan::{adjusted_targets, AdjustmentOutcome, CoachAdjustment, DietPlan, Meal, MealItem, TargetUpdate};
use crate::models::dismissal::CoachDismissal;
use crate::models::food::FoodItem;
use super::errors::RepositoryError;

#[derive(Debug, Default)]
struct Tables {
    /// Keyed by (user, date) so per-user scans come back in date order
    body_logs: BTreeMap<(String, NaiveDate), BodyLog>,
    foods: HashMap<String, FoodItem>,
    /// Plans in creation order
    plans: Vec<DietPlan>,
    dismissals: HashMap<String, CoachDismissal>,
}

fn find_meal_mut<'a>(plans: &'a mut [DietPlan], meal_id: &str) -> Option<&'a mut Meal> {
    plans.iter_mut()
        .flat_map(|plan| plan.variations.iter_mut())
        .flat_map(|variation| variation.meals.iter_mut())
        .find(|meal| meal.id == meal_id)
}

/// In-memory storage used when no database pool is available.
///
/// Clones share the same tables, so one instance can back every repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStorage {
    /// Create a new, empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables.lock().map_err(|e| RepositoryError::Lock(e.to_string()))
    }

    // Body logs

    pub async fn insert_body_log(&self, log: BodyLog) -> Result<BodyLog, RepositoryError> {
        let mut tables = self.lock()?;
        let key = (log.user_id.clone(), log.date);

        if tables.body_logs.contains_key(&key) {
            return Err(RepositoryError::Conflict(format!("a body log already exists for {}", log.date)));
        }

        tables.body_logs.insert(key, log.clone());
        Ok(log)
    }

    pub async fn replace_body_log(
        &self,
        user_id: &str,
        date: NaiveDate,
        request: CreateBodyLogRequest,
    ) -> Result<BodyLog, RepositoryError> {
        let mut tables = self.lock()?;
        let key = (user_id.to_string(), date);

        let existing = tables.body_logs.get(&key)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("no body log for {}", date)))?;

        let new_key = (request.user_id.clone(), request.date);
        if new_key != key && tables.body_logs.contains_key(&new_key) {
            return Err(RepositoryError::Conflict(format!("a body log already exists for {}", request.date)));
        }

        let updated = BodyLog::from_request(existing.id, request, existing.created_at);
        tables.body_logs.remove(&key);
        tables.body_logs.insert(new_key, updated.clone());
        Ok(updated)
    }

    pub async fn delete_body_log(&self, user_id: &str, date: NaiveDate) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        Ok(tables.body_logs.remove(&(user_id.to_string(), date)).is_some())
    }

    pub async fn get_body_log(&self, user_id: &str, date: NaiveDate) -> Result<Option<BodyLog>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.body_logs.get(&(user_id.to_string(), date)).cloned())
    }

    /// Logs between two dates inclusive, oldest first
    pub async fn list_body_logs_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BodyLog>, RepositoryError> {
        let tables = self.lock()?;
        if from > to {
            return Ok(Vec::new());
        }

        let range = (user_id.to_string(), from)..=(user_id.to_string(), to);
        Ok(tables.body_logs.range(range).map(|(_, log)| log.clone()).collect())
    }

    /// All logs of a user, newest first
    pub async fn list_body_logs(&self, user_id: &str) -> Result<Vec<BodyLog>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.body_logs.values()
            .filter(|log| log.user_id == user_id)
            .rev()
            .cloned()
            .collect())
    }

    // Foods

    pub async fn insert_food(&self, food: FoodItem) -> Result<FoodItem, RepositoryError> {
        let mut tables = self.lock()?;
        tables.foods.insert(food.id.clone(), food.clone());
        Ok(food)
    }

    pub async fn get_food(&self, id: &str) -> Result<Option<FoodItem>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.foods.get(id).cloned())
    }

    /// Foods ordered by name, optionally filtered by a case-insensitive name fragment
    pub async fn list_foods(&self, search: Option<&str>) -> Result<Vec<FoodItem>, RepositoryError> {
        let tables = self.lock()?;
        let needle = search.map(str::to_lowercase);

        let mut foods: Vec<FoodItem> = tables.foods.values()
            .filter(|food| match &needle {
                Some(needle) => food.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        foods.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(foods)
    }

    /// Remove a food and every meal item that references it
    pub async fn delete_food(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.foods.remove(id).is_none() {
            return Ok(false);
        }

        for plan in tables.plans.iter_mut() {
            for variation in plan.variations.iter_mut() {
                for meal in variation.meals.iter_mut() {
                    meal.items.retain(|item| item.food.id != id);
                }
            }
        }
        Ok(true)
    }

    // Diet plans

    /// Store a new active plan, deactivating the previous plans of the same user
    pub async fn insert_plan(&self, plan: DietPlan) -> Result<DietPlan, RepositoryError> {
        let mut tables = self.lock()?;

        for existing in tables.plans.iter_mut().filter(|p| p.user_id == plan.user_id) {
            existing.is_active = false;
        }

        tables.plans.push(plan.clone());
        Ok(plan)
    }

    pub async fn get_active_plan(&self, user_id: &str) -> Result<Option<DietPlan>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.plans.iter()
            .rev()
            .find(|plan| plan.user_id == user_id && plan.is_active)
            .cloned())
    }

    /// Overwrite the set targets of a plan
    pub async fn update_plan_targets(&self, plan_id: &str, update: TargetUpdate) -> Result<DietPlan, RepositoryError> {
        let mut tables = self.lock()?;
        let plan = tables.plans.iter_mut()
            .find(|plan| plan.id == plan_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("diet plan {}", plan_id)))?;

        let mut updated = plan.clone();
        update.apply_to(&mut updated).map_err(RepositoryError::Validation)?;
        *plan = updated.clone();
        Ok(updated)
    }

    /// Append an empty meal to a variation of the plan, or to its first variation
    pub async fn insert_meal(
        &self,
        plan_id: &str,
        variation_id: Option<&str>,
        meal: Meal,
    ) -> Result<Meal, RepositoryError> {
        let mut tables = self.lock()?;
        let plan = tables.plans.iter_mut()
            .find(|plan| plan.id == plan_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("diet plan {}", plan_id)))?;

        let variation = match variation_id {
            Some(id) => plan.variations.iter_mut().find(|variation| variation.id == id),
            None => plan.variations.first_mut(),
        }
        .ok_or_else(|| RepositoryError::NotFound(format!("variation of diet plan {}", plan_id)))?;

        variation.meals.push(meal.clone());
        Ok(meal)
    }

    pub async fn rename_meal(&self, meal_id: &str, name: &str) -> Result<Meal, RepositoryError> {
        let mut tables = self.lock()?;
        let meal = find_meal_mut(&mut tables.plans, meal_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("meal {}", meal_id)))?;

        meal.name = name.to_string();
        Ok(meal.clone())
    }

    /// Delete a meal together with its items
    pub async fn delete_meal(&self, meal_id: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;

        for variation in tables.plans.iter_mut().flat_map(|plan| plan.variations.iter_mut()) {
            let before = variation.meals.len();
            variation.meals.retain(|meal| meal.id != meal_id);
            if variation.meals.len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Append an item to the end of a meal
    pub async fn insert_meal_item(&self, meal_id: &str, item: MealItem) -> Result<MealItem, RepositoryError> {
        let mut tables = self.lock()?;
        let meal = find_meal_mut(&mut tables.plans, meal_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("meal {}", meal_id)))?;

        meal.items.push(item.clone());
        Ok(item)
    }

    pub async fn update_meal_item(&self, item_id: &str, quantity_grams: f64) -> Result<MealItem, RepositoryError> {
        let mut tables = self.lock()?;
        let item = tables.plans.iter_mut()
            .flat_map(|plan| plan.variations.iter_mut())
            .flat_map(|variation| variation.meals.iter_mut())
            .flat_map(|meal| meal.items.iter_mut())
            .find(|item| item.id == item_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("meal item {}", item_id)))?;

        item.quantity_grams = quantity_grams;
        Ok(item.clone())
    }

    pub async fn delete_meal_item(&self, item_id: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.lock()?;

        let meals = tables.plans.iter_mut()
            .flat_map(|plan| plan.variations.iter_mut())
            .flat_map(|variation| variation.meals.iter_mut());
        for meal in meals {
            let before = meal.items.len();
            meal.items.retain(|item| item.id != item_id);
            if meal.items.len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Update the active plan and record the anchor as applied under one lock
    pub async fn apply_coach_adjustment(
        &self,
        user_id: &str,
        adjustment: CoachAdjustment,
        recorded_at: DateTime<Utc>,
    ) -> Result<AdjustmentOutcome, RepositoryError> {
        let mut tables = self.lock()?;
        let tables = &mut *tables;

        let plan = tables.plans.iter_mut()
            .rev()
            .find(|plan| plan.user_id == user_id && plan.is_active)
            .ok_or_else(|| RepositoryError::NotFound(format!("no active diet plan for user {}", user_id)))?;

        if let Some(dismissal) = tables.dismissals.get(user_id) {
            if dismissal.applied && dismissal.matches(adjustment.w_curr, adjustment.w_prev) {
                return Ok(AdjustmentOutcome::AlreadyApplied(plan.clone()));
            }
        }

        let (calories, carbs) = adjusted_targets(plan, adjustment.calorie_delta, adjustment.carb_delta)
            .map_err(RepositoryError::Validation)?;
        plan.target_calories = calories;
        plan.target_carbs = carbs;

        tables.dismissals.insert(user_id.to_string(), CoachDismissal {
            user_id: user_id.to_string(),
            w_curr: adjustment.w_curr,
            w_prev: adjustment.w_prev,
            applied: true,
            recorded_at,
        });

        Ok(AdjustmentOutcome::Applied(plan.clone()))
    }

    // Dismissals

    pub async fn get_dismissal(&self, user_id: &str) -> Result<Option<CoachDismissal>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.dismissals.get(user_id).cloned())
    }

    pub async fn put_dismissal(&self, dismissal: CoachDismissal) -> Result<CoachDismissal, RepositoryError> {
        let mut tables = self.lock()?;
        tables.dismissals.insert(dismissal.user_id.clone(), dismissal.clone());
        Ok(dismissal)
    }
}
