use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;
use async_trait::async_trait;

use bulk_coach_data::models::diet_plan::{AdjustmentOutcome, CoachAdjustment};
use bulk_coach_data::repository::{
    BodyLogRepository, BodyLogRepositoryTrait, DietPlanRepository, DietPlanRepositoryTrait, DismissalRepository,
    DismissalRepositoryTrait, RepositoryError, StorageBackend,
};

use crate::clock::{Clock, SystemClock};
use crate::config::CoachConfig;
use crate::entities::body_log::BodyLogEntry;
use crate::entities::coaching::{
    Anchor, ApplyOutcome, ApplySuggestionRequest, CoachingVerdict, DismissSuggestionRequest, DismissalRecord,
    TrendResult,
};
use crate::entities::conversions;
use crate::services::suggestion::evaluate;
use crate::services::trend::{analyze, TrendError, ANALYSIS_WINDOW_DAYS};
use crate::services::validation_message;

/// Coaching service errors
#[derive(Debug, Error)]
pub enum CoachServiceError {
    /// Not enough weigh-ins to compute a trend
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The suggestion is stale or would make a target negative
    #[error("Invalid adjustment: {0}")]
    InvalidAdjustment(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<TrendError> for CoachServiceError {
    fn from(error: TrendError) -> Self {
        match error {
            TrendError::InsufficientData(msg) => CoachServiceError::InsufficientData(msg),
        }
    }
}

/// Trait for coaching operations
#[async_trait]
pub trait CoachServiceTrait: Send + Sync {
    /// Analyze the last two weeks of weigh-ins and decide on a suggestion. Nothing is written.
    async fn check_stagnation(&self, user_id: &str) -> Result<CoachingVerdict, CoachServiceError>;

    /// Apply a suggestion to the active plan and record its anchor
    async fn apply_suggestion(&self, request: ApplySuggestionRequest) -> Result<ApplyOutcome, CoachServiceError>;

    /// Record an anchor as dismissed without touching the plan
    async fn dismiss_suggestion(&self, request: DismissSuggestionRequest) -> Result<DismissalRecord, CoachServiceError>;
}

/// Coaching service over the body log, plan and dismissal repositories
pub struct CoachService<B, P, D>
where
    B: BodyLogRepositoryTrait,
    P: DietPlanRepositoryTrait,
    D: DismissalRepositoryTrait,
{
    body_logs: B,
    plans: P,
    dismissals: D,
    clock: Arc<dyn Clock>,
    config: CoachConfig,
}

impl<B, P, D> CoachService<B, P, D>
where
    B: BodyLogRepositoryTrait,
    P: DietPlanRepositoryTrait,
    D: DismissalRepositoryTrait,
{
    pub fn new(body_logs: B, plans: P, dismissals: D, clock: Arc<dyn Clock>, config: CoachConfig) -> Self {
        Self {
            body_logs,
            plans,
            dismissals,
            clock,
            config,
        }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> CoachServiceError {
        match err {
            RepositoryError::NotFound(msg) => CoachServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => CoachServiceError::InvalidAdjustment(msg),
            _ => CoachServiceError::RepositoryError(err.to_string()),
        }
    }

    /// Logs of the analysis window ending today, oldest first
    async fn recent_logs(&self, user_id: &str) -> Result<Vec<BodyLogEntry>, CoachServiceError> {
        let as_of = self.clock.today();
        let logs = self.body_logs
            .list_recent(user_id, ANALYSIS_WINDOW_DAYS, as_of)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(logs.into_iter().map(conversions::convert_to_domain_body_log).collect())
    }

    async fn current_trend(&self, user_id: &str) -> Result<(TrendResult, Vec<BodyLogEntry>), CoachServiceError> {
        let recent = self.recent_logs(user_id).await?;
        let trend = analyze(&recent, self.clock.today())?;
        Ok((trend, recent))
    }

    async fn last_dismissal(&self, user_id: &str) -> Result<Option<DismissalRecord>, CoachServiceError> {
        let record = self.dismissals
            .get(user_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;
        Ok(record.map(conversions::convert_to_domain_dismissal))
    }
}

#[async_trait]
impl<B, P, D> CoachServiceTrait for CoachService<B, P, D>
where
    B: BodyLogRepositoryTrait,
    P: DietPlanRepositoryTrait,
    D: DismissalRepositoryTrait,
{
    async fn check_stagnation(&self, user_id: &str) -> Result<CoachingVerdict, CoachServiceError> {
        if user_id.trim().is_empty() {
            return Err(CoachServiceError::ValidationError("user_id is required".to_string()));
        }

        let (trend, recent) = self.current_trend(user_id).await?;

        let plan = self.plans
            .get_active_plan(user_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_plan);
        let dismissal = self.last_dismissal(user_id).await?;

        let verdict = evaluate(&trend, plan.as_ref(), &recent, dismissal.as_ref(), &self.config);

        info!(
            user_id,
            current_avg = verdict.anchor.w_curr,
            previous_avg = verdict.anchor.w_prev,
            weekly_rate = trend.weekly_rate,
            state = %trend.analysis_state,
            stagnating = verdict.is_stagnating,
            already_adjusted = verdict.already_adjusted,
            suggest_cutting = verdict.suggest_cutting,
            "Coach check completed"
        );

        Ok(verdict)
    }

    async fn apply_suggestion(&self, request: ApplySuggestionRequest) -> Result<ApplyOutcome, CoachServiceError> {
        request.validate().map_err(|e| CoachServiceError::ValidationError(validation_message(&e)))?;

        let user_id = request.user_id.as_str();
        let anchor = Anchor::new(request.w_curr, request.w_prev);

        // Same anchor already applied; a dismissed anchor may still be applied
        if let Some(record) = self.last_dismissal(user_id).await? {
            if record.applied && record.anchor.matches(&anchor) {
                info!(user_id, "Suggestion already applied for this anchor, nothing to do");
                let plan = self.plans
                    .get_active_plan(user_id)
                    .await
                    .map_err(|e| self.map_repo_error(e))?
                    .ok_or_else(|| CoachServiceError::NotFound(format!("no active diet plan for user {}", user_id)))?;
                return Ok(ApplyOutcome {
                    plan: conversions::convert_to_domain_plan(plan),
                    applied: false,
                });
            }
        }

        let trend = match self.current_trend(user_id).await {
            Ok((trend, _)) => trend,
            Err(CoachServiceError::InsufficientData(msg)) => {
                warn!(user_id, "Rejecting apply without a current trend: {}", msg);
                return Err(CoachServiceError::InvalidAdjustment(format!(
                    "the suggestion no longer matches your data ({}); run the check again",
                    msg
                )));
            }
            Err(e) => return Err(e),
        };

        let current = trend.anchor();
        if !current.matches(&anchor) {
            warn!(
                user_id,
                supplied_curr = anchor.w_curr,
                supplied_prev = anchor.w_prev,
                current_curr = current.w_curr,
                current_prev = current.w_prev,
                "Rejecting stale suggestion"
            );
            return Err(CoachServiceError::InvalidAdjustment(
                "the suggestion is out of date; run the check again".to_string(),
            ));
        }

        let adjustment = CoachAdjustment {
            calorie_delta: request.calorie_adjustment,
            carb_delta: request.carb_adjustment_g,
            w_curr: anchor.w_curr,
            w_prev: anchor.w_prev,
        };

        let outcome = self.plans
            .apply_coach_adjustment(user_id, adjustment)
            .await
            .map_err(|e| {
                warn!(user_id, "Apply failed: {}", e);
                self.map_repo_error(e)
            })?;

        let applied = matches!(outcome, AdjustmentOutcome::Applied(_));
        let plan = conversions::convert_to_domain_plan(outcome.into_plan());

        info!(
            user_id,
            applied,
            calorie_adjustment = request.calorie_adjustment,
            carb_adjustment_g = request.carb_adjustment_g,
            target_calories = plan.target_calories,
            target_carbs = plan.target_carbs,
            "Coach suggestion applied"
        );

        Ok(ApplyOutcome { plan, applied })
    }

    async fn dismiss_suggestion(&self, request: DismissSuggestionRequest) -> Result<DismissalRecord, CoachServiceError> {
        request.validate().map_err(|e| CoachServiceError::ValidationError(validation_message(&e)))?;

        let user_id = request.user_id.as_str();
        let anchor = Anchor::new(request.w_curr, request.w_prev);

        if let Some(record) = self.last_dismissal(user_id).await? {
            if record.anchor.matches(&anchor) {
                return Ok(record);
            }
        }

        let record = self.dismissals
            .put(user_id, anchor.w_curr, anchor.w_prev, false)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!(user_id, w_curr = anchor.w_curr, w_prev = anchor.w_prev, "Coach suggestion dismissed");

        Ok(conversions::convert_to_domain_dismissal(record))
    }
}

/// Coaching service type built by the factory functions
pub type DefaultCoachService = CoachService<BodyLogRepository, DietPlanRepository, DismissalRepository>;

/// Create the coaching service over a shared storage backend, reading today from `clock`
pub fn create_coach_service(backend: StorageBackend, config: CoachConfig, clock: Arc<dyn Clock>) -> DefaultCoachService {
    CoachService::new(
        BodyLogRepository::new(backend.clone()),
        DietPlanRepository::new(backend.clone()),
        DismissalRepository::new(backend),
        clock,
        config,
    )
}

/// Create the coaching service on the system clock
pub fn create_default_coach_service(backend: StorageBackend, config: CoachConfig) -> DefaultCoachService {
    create_coach_service(backend, config, Arc::new(SystemClock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::testing::fixtures::{as_of, seed_food, seed_history, seed_plan};
    use bulk_coach_data::repository::tests::MockBodyLogRepository;
    use bulk_coach_data::repository::FoodRepository;

    fn service(backend: &StorageBackend) -> DefaultCoachService {
        create_coach_service(backend.clone(), CoachConfig::default(), Arc::new(FixedClock(as_of())))
    }

    async fn flat_user(backend: &StorageBackend) {
        seed_history(&BodyLogRepository::new(backend.clone()), "user-1", &[85.0; 14]).await;
        let food = seed_food(&FoodRepository::new(backend.clone())).await;
        seed_plan(&DietPlanRepository::new(backend.clone()), "user-1", &food, 3000.0, 350.0).await;
    }

    fn apply_request(verdict: &CoachingVerdict) -> ApplySuggestionRequest {
        ApplySuggestionRequest {
            user_id: "user-1".to_string(),
            calorie_adjustment: verdict.suggested_calorie_adjustment,
            carb_adjustment_g: verdict.suggested_carb_adjustment_g,
            w_curr: verdict.anchor.w_curr,
            w_prev: verdict.anchor.w_prev,
        }
    }

    #[tokio::test]
    async fn test_check_stagnation_flat_weight() {
        let backend = StorageBackend::in_memory();
        flat_user(&backend).await;

        let verdict = service(&backend).check_stagnation("user-1").await.unwrap();

        assert!(verdict.is_stagnating);
        assert_eq!(verdict.suggested_carb_adjustment_g, 42.5);
        assert_eq!(verdict.suggested_calorie_adjustment, 170.0);
        assert_eq!(verdict.new_target_calories, Some(3170.0));
    }

    #[tokio::test]
    async fn test_check_stagnation_without_data() {
        let backend = StorageBackend::in_memory();
        let result = service(&backend).check_stagnation("nobody").await;
        assert!(matches!(result, Err(CoachServiceError::InsufficientData(_))));
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        for backend in [StorageBackend::in_memory(), StorageBackend::sqlite_in_memory().unwrap()] {
            flat_user(&backend).await;
            let service = service(&backend);
            let verdict = service.check_stagnation("user-1").await.unwrap();

            let first = service.apply_suggestion(apply_request(&verdict)).await.unwrap();
            assert!(first.applied);
            assert_eq!(first.plan.target_calories, 3170.0);
            assert_eq!(first.plan.target_carbs, 392.5);

            let second = service.apply_suggestion(apply_request(&verdict)).await.unwrap();
            assert!(!second.applied);
            assert_eq!(second.plan.target_calories, 3170.0);
            assert_eq!(second.plan.target_carbs, 392.5);

            // The verdict is now suppressed until new weigh-ins arrive
            let after = service.check_stagnation("user-1").await.unwrap();
            assert!(after.already_adjusted);
            assert!(!after.is_stagnating);
        }
    }

    #[tokio::test]
    async fn test_apply_rejects_stale_anchor() {
        let backend = StorageBackend::in_memory();
        flat_user(&backend).await;
        let service = service(&backend);
        let verdict = service.check_stagnation("user-1").await.unwrap();

        let mut request = apply_request(&verdict);
        request.w_curr += 0.3;

        let result = service.apply_suggestion(request).await;
        assert!(matches!(result, Err(CoachServiceError::InvalidAdjustment(_))));

        let plan = DietPlanRepository::new(backend.clone()).get_active_plan("user-1").await.unwrap().unwrap();
        assert_eq!(plan.target_calories, 3000.0);
    }

    #[tokio::test]
    async fn test_apply_rejects_negative_targets() {
        let backend = StorageBackend::in_memory();
        seed_history(&BodyLogRepository::new(backend.clone()), "user-1", &[85.0; 14]).await;
        let food = seed_food(&FoodRepository::new(backend.clone())).await;
        seed_plan(&DietPlanRepository::new(backend.clone()), "user-1", &food, 3000.0, 20.0).await;
        let service = service(&backend);
        let verdict = service.check_stagnation("user-1").await.unwrap();

        let mut request = apply_request(&verdict);
        request.carb_adjustment_g = -42.5;

        let result = service.apply_suggestion(request).await;
        assert!(matches!(result, Err(CoachServiceError::InvalidAdjustment(_))));

        let plan = DietPlanRepository::new(backend.clone()).get_active_plan("user-1").await.unwrap().unwrap();
        assert_eq!(plan.target_carbs, 20.0);
        assert_eq!(plan.target_calories, 3000.0);
        assert!(DismissalRepository::new(backend).get("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_apply_without_plan_is_not_found() {
        let backend = StorageBackend::in_memory();
        seed_history(&BodyLogRepository::new(backend.clone()), "user-1", &[85.0; 14]).await;
        let service = service(&backend);
        let verdict = service.check_stagnation("user-1").await.unwrap();

        let result = service.apply_suggestion(apply_request(&verdict)).await;
        assert!(matches!(result, Err(CoachServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dismiss_suppresses_until_new_data() {
        let backend = StorageBackend::in_memory();
        flat_user(&backend).await;
        let service = service(&backend);
        let verdict = service.check_stagnation("user-1").await.unwrap();

        let record = service.dismiss_suggestion(DismissSuggestionRequest {
            user_id: "user-1".to_string(),
            w_curr: verdict.anchor.w_curr,
            w_prev: verdict.anchor.w_prev,
        }).await.unwrap();
        assert!(!record.applied);

        let suppressed = service.check_stagnation("user-1").await.unwrap();
        assert!(suppressed.already_adjusted);
        assert!(!suppressed.is_stagnating);

        // A new weigh-in moves the anchor
        let logs = BodyLogRepository::new(backend.clone());
        logs.delete("user-1", as_of()).await.unwrap();
        seed_history(&logs, "user-1", &[85.05]).await;

        let fresh = service.check_stagnation("user-1").await.unwrap();
        assert!(!fresh.already_adjusted);
        assert!(fresh.is_stagnating);

        let plan = DietPlanRepository::new(backend).get_active_plan("user-1").await.unwrap().unwrap();
        assert_eq!(plan.target_calories, 3000.0);
    }

    #[tokio::test]
    async fn test_apply_after_dismiss_changes_plan() {
        for backend in [StorageBackend::in_memory(), StorageBackend::sqlite_in_memory().unwrap()] {
            flat_user(&backend).await;
            let service = service(&backend);
            let verdict = service.check_stagnation("user-1").await.unwrap();

            service.dismiss_suggestion(DismissSuggestionRequest {
                user_id: "user-1".to_string(),
                w_curr: verdict.anchor.w_curr,
                w_prev: verdict.anchor.w_prev,
            }).await.unwrap();

            let outcome = service.apply_suggestion(apply_request(&verdict)).await.unwrap();
            assert!(outcome.applied, "{}", backend.describe());
            assert_eq!(outcome.plan.target_calories, 3170.0);
            assert_eq!(outcome.plan.target_carbs, 392.5);

            let record = DismissalRepository::new(backend.clone()).get("user-1").await.unwrap().unwrap();
            assert!(record.applied);

            // Dismissing an applied anchor keeps it applied
            let redismissed = service.dismiss_suggestion(DismissSuggestionRequest {
                user_id: "user-1".to_string(),
                w_curr: verdict.anchor.w_curr,
                w_prev: verdict.anchor.w_prev,
            }).await.unwrap();
            assert!(redismissed.applied);

            let again = service.apply_suggestion(apply_request(&verdict)).await.unwrap();
            assert!(!again.applied);
            assert_eq!(again.plan.target_calories, 3170.0);
        }
    }

    #[tokio::test]
    async fn test_repository_failure_is_reported() {
        let service = CoachService::new(
            MockBodyLogRepository::failing(),
            DietPlanRepository::new(StorageBackend::in_memory()),
            DismissalRepository::new(StorageBackend::in_memory()),
            Arc::new(FixedClock(as_of())),
            CoachConfig::default(),
        );

        let result = service.check_stagnation("user-1").await;
        assert!(matches!(result, Err(CoachServiceError::RepositoryError(_))));
    }

    #[tokio::test]
    async fn test_invalid_requests_are_rejected() {
        let backend = StorageBackend::in_memory();
        let service = service(&backend);

        assert!(matches!(
            service.check_stagnation("  ").await,
            Err(CoachServiceError::ValidationError(_))
        ));

        let result = service.dismiss_suggestion(DismissSuggestionRequest {
            user_id: String::new(),
            w_curr: 80.0,
            w_prev: 79.0,
        }).await;
        assert!(matches!(result, Err(CoachServiceError::ValidationError(_))));
    }
}
