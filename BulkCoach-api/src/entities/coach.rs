use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use bulk_coach_domain::entities::coaching::{round2, AnalysisState, ApplyOutcome, CoachingVerdict, DismissalRecord};

/// Flattened coaching verdict.
///
/// `current_week_avg_weight` and `previous_week_avg_weight` are the anchor of the
/// verdict; send them back unchanged as `w_curr` and `w_prev` to apply or dismiss it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StagnationCheckResponse {
    pub is_stagnating: bool,
    /// The last dismissed or applied suggestion has this same anchor
    pub already_adjusted: bool,
    pub message: String,
    pub analysis_state: AnalysisState,
    pub current_week_avg_weight: f64,
    pub previous_week_avg_weight: f64,
    pub weight_change_kg: f64,
    pub weekly_rate: f64,
    pub monthly_projection: f64,
    pub weeks_elapsed: f64,
    #[schema(value_type = String, format = Date)]
    pub anchor_date: NaiveDate,
    pub suggested_calorie_adjustment: f64,
    pub suggested_carb_adjustment_g: f64,
    pub current_calories: Option<f64>,
    pub suggested_calories: Option<f64>,
    pub current_carbs_g: Option<f64>,
    pub suggested_carbs_g: Option<f64>,
    pub current_carbs_per_kg: Option<f64>,
    pub suggested_carbs_per_kg: Option<f64>,
    pub new_target_calories: Option<f64>,
    pub new_target_carbs: Option<f64>,
    pub suggest_cutting: bool,
    pub cutting_reasons: Vec<String>,
    pub current_body_fat_percent: Option<f64>,
    pub waist_change_cm: Option<f64>,
    pub arm_change_cm: Option<f64>,
}

impl From<CoachingVerdict> for StagnationCheckResponse {
    fn from(verdict: CoachingVerdict) -> Self {
        let trend = verdict.trend;
        Self {
            is_stagnating: verdict.is_stagnating,
            already_adjusted: verdict.already_adjusted,
            message: verdict.message,
            analysis_state: trend.analysis_state,
            current_week_avg_weight: verdict.anchor.w_curr,
            previous_week_avg_weight: verdict.anchor.w_prev,
            weight_change_kg: round2(trend.weight_change_kg),
            weekly_rate: round2(trend.weekly_rate),
            monthly_projection: round2(trend.monthly_projection),
            weeks_elapsed: round2(trend.weeks_elapsed),
            anchor_date: trend.anchor_date,
            suggested_calorie_adjustment: verdict.suggested_calorie_adjustment,
            suggested_carb_adjustment_g: verdict.suggested_carb_adjustment_g,
            current_calories: verdict.current_calories,
            suggested_calories: verdict.suggested_calories,
            current_carbs_g: verdict.current_carbs_g,
            suggested_carbs_g: verdict.suggested_carbs_g,
            current_carbs_per_kg: verdict.current_carbs_per_kg,
            suggested_carbs_per_kg: verdict.suggested_carbs_per_kg,
            new_target_calories: verdict.new_target_calories,
            new_target_carbs: verdict.new_target_carbs,
            suggest_cutting: verdict.suggest_cutting,
            cutting_reasons: verdict.cutting_reasons,
            current_body_fat_percent: verdict.current_body_fat_percent,
            waist_change_cm: verdict.waist_change_cm,
            arm_change_cm: verdict.arm_change_cm,
        }
    }
}

/// Plan targets after an apply request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplySuggestionResponse {
    /// False when this anchor was already applied or dismissed and nothing changed
    pub applied: bool,
    pub message: String,
    pub plan_id: String,
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_carbs: f64,
    pub target_fat: f64,
}

impl From<ApplyOutcome> for ApplySuggestionResponse {
    fn from(outcome: ApplyOutcome) -> Self {
        let message = if outcome.applied {
            "Diet plan updated with the suggested adjustment"
        } else {
            "This suggestion was already handled; the plan is unchanged"
        };

        Self {
            applied: outcome.applied,
            message: message.to_string(),
            plan_id: outcome.plan.id,
            target_calories: outcome.plan.target_calories,
            target_protein: outcome.plan.target_protein,
            target_carbs: outcome.plan.target_carbs,
            target_fat: outcome.plan.target_fat,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DismissSuggestionResponse {
    pub dismissed: bool,
    pub w_curr: f64,
    pub w_prev: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<DismissalRecord> for DismissSuggestionResponse {
    fn from(record: DismissalRecord) -> Self {
        Self {
            dismissed: true,
            w_curr: record.anchor.w_curr,
            w_prev: record.anchor.w_prev,
            recorded_at: record.recorded_at,
        }
    }
}
