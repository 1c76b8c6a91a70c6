use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use bulk_coach_data::models::dismissal::hundredths;

use super::diet::DietPlan;

/// Classification of the weight trend, checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    /// Weekly rate below zero
    WeightLoss,
    /// Projected gain under 0.5 kg per month
    SlowGain,
    /// Projected gain between 0.5 and 1.5 kg per month
    Optimal,
    /// Projected gain above 1.5 kg per month
    HighVelocity,
}

impl AnalysisState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisState::WeightLoss => "weight_loss",
            AnalysisState::SlowGain => "slow_gain",
            AnalysisState::Optimal => "optimal",
            AnalysisState::HighVelocity => "high_velocity",
        }
    }
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to two decimals, the precision weights are reported and compared at
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The (current, previous) weekly averages identifying one trend computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Anchor {
    pub w_curr: f64,
    pub w_prev: f64,
}

impl Anchor {
    /// Build an anchor, rounding both weights to hundredths
    pub fn new(w_curr: f64, w_prev: f64) -> Self {
        Self {
            w_curr: round2(w_curr),
            w_prev: round2(w_prev),
        }
    }

    /// Equality at hundredth precision
    pub fn matches(&self, other: &Anchor) -> bool {
        hundredths(self.w_curr) == hundredths(other.w_curr)
            && hundredths(self.w_prev) == hundredths(other.w_prev)
    }
}

/// Output of the weight trend analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TrendResult {
    pub current_week_avg_weight: f64,
    pub previous_week_avg_weight: f64,
    pub weight_change_kg: f64,
    /// Weight change per week of elapsed time
    pub weekly_rate: f64,
    /// Weekly rate scaled to an average month
    pub monthly_projection: f64,
    pub weeks_elapsed: f64,
    pub analysis_state: AnalysisState,
    /// Date of the most recent entry in the window
    #[cfg_attr(feature = "with-api", schema(value_type = String, format = Date))]
    pub anchor_date: NaiveDate,
    pub anchor_weight_kg: f64,
    pub current_week_entries: usize,
    pub previous_week_entries: usize,
}

impl TrendResult {
    pub fn anchor(&self) -> Anchor {
        Anchor::new(self.current_week_avg_weight, self.previous_week_avg_weight)
    }
}

/// The last suggestion a user dismissed or applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DismissalRecord {
    pub user_id: String,
    pub anchor: Anchor,
    /// True when recorded by applying the suggestion
    pub applied: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Coaching decision for one trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CoachingVerdict {
    pub trend: TrendResult,
    pub anchor: Anchor,
    pub is_stagnating: bool,
    /// The stored dismissal matched this trend's anchor
    pub already_adjusted: bool,
    pub message: String,
    pub suggest_cutting: bool,
    pub cutting_reasons: Vec<String>,
    pub current_body_fat_percent: Option<f64>,
    pub waist_change_cm: Option<f64>,
    pub arm_change_cm: Option<f64>,
    /// Signed kcal change, 0 when no adjustment is suggested
    pub suggested_calorie_adjustment: f64,
    /// Signed carbohydrate change in grams, 0 when no adjustment is suggested
    pub suggested_carb_adjustment_g: f64,
    pub current_calories: Option<f64>,
    pub suggested_calories: Option<f64>,
    pub current_carbs_g: Option<f64>,
    pub suggested_carbs_g: Option<f64>,
    pub current_carbs_per_kg: Option<f64>,
    pub suggested_carbs_per_kg: Option<f64>,
    pub new_target_calories: Option<f64>,
    pub new_target_carbs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CheckStagnationRequest {
    #[validate(length(min = 1, max = 128, message = "user_id must be between 1 and 128 characters"))]
    pub user_id: String,
}

/// Apply a suggestion to the active plan, echoing the anchor it was computed from
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ApplySuggestionRequest {
    #[validate(length(min = 1, max = 128, message = "user_id must be between 1 and 128 characters"))]
    pub user_id: String,

    #[validate(range(min = -5000.0, max = 5000.0, message = "Calorie adjustment must be between -5000 and 5000"))]
    pub calorie_adjustment: f64,

    #[validate(range(min = -1250.0, max = 1250.0, message = "Carbohydrate adjustment must be between -1250 and 1250 g"))]
    pub carb_adjustment_g: f64,

    #[validate(range(min = 0.0, max = 1000.0, message = "w_curr must be a body weight in kg"))]
    pub w_curr: f64,

    #[validate(range(min = 0.0, max = 1000.0, message = "w_prev must be a body weight in kg"))]
    pub w_prev: f64,
}

/// Dismiss a suggestion until the anchor changes
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DismissSuggestionRequest {
    #[validate(length(min = 1, max = 128, message = "user_id must be between 1 and 128 characters"))]
    pub user_id: String,

    #[validate(range(min = 0.0, max = 1000.0, message = "w_curr must be a body weight in kg"))]
    pub w_curr: f64,

    #[validate(range(min = 0.0, max = 1000.0, message = "w_prev must be a body weight in kg"))]
    pub w_prev: f64,
}

/// Result of an apply request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ApplyOutcome {
    pub plan: DietPlan,
    /// False when the anchor had already been applied or dismissed and nothing changed
    pub applied: bool,
}
