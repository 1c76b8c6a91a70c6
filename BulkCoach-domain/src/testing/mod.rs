// Testing utilities and mock implementations for the domain layer
// Available in unit tests and with the "mock" feature

// Re-export useful test mocks from the data layer
pub use bulk_coach_data::repository::tests::MockBodyLogRepository;

use std::collections::HashMap;
use async_trait::async_trait;

use crate::entities::coaching::{
    Anchor, ApplyOutcome, ApplySuggestionRequest, CoachingVerdict, DismissSuggestionRequest, DismissalRecord,
};
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::coach::{CoachServiceError, CoachServiceTrait};

/// Fixed dates and sample records shared by the tests
pub mod fixtures {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use bulk_coach_data::models::{body_log as data_body_log, diet_plan as data_plan, food as data_food};
    use bulk_coach_data::repository::{
        BodyLogRepository, BodyLogRepositoryTrait, DietPlanRepository, DietPlanRepositoryTrait, FoodRepository,
        FoodRepositoryTrait,
    };

    use crate::entities::body_log::{BodyLogEntry, CreateBodyLogRequest};
    use crate::entities::coaching::{AnalysisState, TrendResult};
    use crate::entities::diet::{CreateFoodItemRequest, DietPlan, DietVariation, FoodItem, Meal, MealItem};

    /// The "today" every test analysis runs on
    pub fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    pub fn days_ago(days: i64) -> NaiveDate {
        as_of() - Duration::days(days)
    }

    /// A bare weigh-in for "user-1"
    pub fn entry_days_ago(days: i64, weight_kg: f64) -> BodyLogEntry {
        BodyLogEntry {
            id: format!("log-{}", days),
            user_id: "user-1".to_string(),
            date: days_ago(days),
            weight_kg,
            bio_body_fat_percent: None,
            bio_muscle_mass_kg: None,
            skinfolds: Default::default(),
            circumferences: Default::default(),
            calculated_body_density: None,
            calculated_body_fat_percent: None,
        }
    }

    pub fn log_request(user_id: &str, date: NaiveDate, weight_kg: f64) -> CreateBodyLogRequest {
        CreateBodyLogRequest {
            user_id: user_id.to_string(),
            date,
            weight_kg,
            bio_body_fat_percent: None,
            bio_muscle_mass_kg: None,
            skinfolds: Default::default(),
            circumferences: Default::default(),
        }
    }

    /// 200 kcal, 10 g protein, 30 g carbs, 5 g fat per 100 g
    pub fn food_request() -> CreateFoodItemRequest {
        CreateFoodItemRequest {
            name: "Test Oats".to_string(),
            brand: None,
            calories_kcal: 200.0,
            protein_g: 10.0,
            carbs_g: 30.0,
            fat_g: 5.0,
        }
    }

    /// An active plan with one meal of 150 g of the sample food
    pub fn sample_plan(target_calories: f64, target_carbs: f64) -> DietPlan {
        let request = food_request();
        DietPlan {
            id: "plan-1".to_string(),
            user_id: "user-1".to_string(),
            target_calories,
            target_protein: 160.0,
            target_carbs,
            target_fat: 70.0,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            variations: vec![DietVariation {
                id: "variation-1".to_string(),
                name: "Principal".to_string(),
                meals: vec![Meal {
                    id: "meal-1".to_string(),
                    name: "Breakfast".to_string(),
                    order_index: 0,
                    items: vec![MealItem {
                        id: "item-1".to_string(),
                        quantity_grams: 150.0,
                        food: FoodItem {
                            id: "food-1".to_string(),
                            name: request.name,
                            brand: None,
                            calories_kcal: request.calories_kcal,
                            protein_g: request.protein_g,
                            carbs_g: request.carbs_g,
                            fat_g: request.fat_g,
                        },
                    }],
                }],
            }],
        }
    }

    /// A trend with the given state and weekly averages one week apart
    pub fn trend_with(state: AnalysisState, current_avg: f64, previous_avg: f64) -> TrendResult {
        let change = current_avg - previous_avg;
        TrendResult {
            current_week_avg_weight: current_avg,
            previous_week_avg_weight: previous_avg,
            weight_change_kg: change,
            weekly_rate: change,
            monthly_projection: change * crate::services::trend::WEEKS_PER_MONTH,
            weeks_elapsed: 1.0,
            analysis_state: state,
            anchor_date: as_of(),
            anchor_weight_kg: current_avg,
            current_week_entries: 7,
            previous_week_entries: 7,
        }
    }

    /// Store one daily weigh-in per weight, the last one dated `as_of`
    pub async fn seed_history(repo: &BodyLogRepository, user_id: &str, weights_oldest_first: &[f64]) {
        let count = weights_oldest_first.len() as i64;
        for (i, weight_kg) in weights_oldest_first.iter().enumerate() {
            let request = data_body_log::CreateBodyLogRequest {
                user_id: user_id.to_string(),
                date: days_ago(count - 1 - i as i64),
                weight_kg: *weight_kg,
                bio_body_fat_percent: None,
                bio_muscle_mass_kg: None,
                skinfolds: Default::default(),
                circumferences: Default::default(),
                calculated_body_density: None,
                calculated_body_fat_percent: None,
            };
            repo.create(request).await.unwrap();
        }
    }

    /// Store the sample food, returning its id
    pub async fn seed_food(repo: &FoodRepository) -> String {
        let request = food_request();
        let food = repo
            .create(data_food::CreateFoodItemRequest {
                name: request.name,
                brand: request.brand,
                calories_kcal: request.calories_kcal,
                protein_g: request.protein_g,
                carbs_g: request.carbs_g,
                fat_g: request.fat_g,
            })
            .await
            .unwrap();
        food.id
    }

    /// Store an active plan with one 150 g meal of `food_id`
    pub async fn seed_plan(
        repo: &DietPlanRepository,
        user_id: &str,
        food_id: &str,
        target_calories: f64,
        target_carbs: f64,
    ) -> data_plan::DietPlan {
        repo.create(data_plan::CreateDietPlanRequest {
            user_id: user_id.to_string(),
            target_calories,
            target_protein: 160.0,
            target_carbs,
            target_fat: 70.0,
            variations: vec![data_plan::CreateDietVariation {
                name: "Principal".to_string(),
                meals: vec![data_plan::CreateMeal {
                    name: "Breakfast".to_string(),
                    items: vec![data_plan::CreateMealItem {
                        food_item_id: food_id.to_string(),
                        quantity_grams: 150.0,
                    }],
                }],
            }],
        })
        .await
        .unwrap()
    }
}

/// Mock coaching service returning a canned verdict or a canned error
pub struct MockCoachService {
    verdict: Option<CoachingVerdict>,
    failure: Option<fn() -> CoachServiceError>,
}

impl MockCoachService {
    /// Every call fails with insufficient data
    pub fn new() -> Self {
        Self {
            verdict: None,
            failure: None,
        }
    }

    /// Answer `check_stagnation` with this verdict
    pub fn with_verdict(mut self, verdict: CoachingVerdict) -> Self {
        self.verdict = Some(verdict);
        self
    }

    /// Fail every call with the error built by `failure`
    pub fn with_failure(mut self, failure: fn() -> CoachServiceError) -> Self {
        self.failure = Some(failure);
        self
    }

    fn check(&self) -> Result<(), CoachServiceError> {
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

impl Default for MockCoachService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoachServiceTrait for MockCoachService {
    async fn check_stagnation(&self, _user_id: &str) -> Result<CoachingVerdict, CoachServiceError> {
        self.check()?;
        self.verdict
            .clone()
            .ok_or_else(|| CoachServiceError::InsufficientData("mock has no verdict".to_string()))
    }

    async fn apply_suggestion(&self, request: ApplySuggestionRequest) -> Result<ApplyOutcome, CoachServiceError> {
        self.check()?;
        Err(CoachServiceError::NotFound(format!("no active diet plan for user {}", request.user_id)))
    }

    async fn dismiss_suggestion(&self, request: DismissSuggestionRequest) -> Result<DismissalRecord, CoachServiceError> {
        self.check()?;
        Ok(DismissalRecord {
            user_id: request.user_id,
            anchor: Anchor::new(request.w_curr, request.w_prev),
            applied: false,
            recorded_at: chrono::Utc::now(),
        })
    }
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    database_status: ComponentStatus,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// All components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
        }
    }

    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();
        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database_status.clone(),
                details: match self.database_status {
                    ComponentStatus::Healthy => None,
                    ComponentStatus::Degraded => Some("Database is experiencing high load".to_string()),
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                },
            },
        );

        let status = match self.database_status {
            ComponentStatus::Healthy => SystemStatus::Healthy,
            ComponentStatus::Degraded => SystemStatus::Degraded,
            ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
        };

        SystemHealth { status, components }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
            _ => Ok(true),
        }
    }
}
