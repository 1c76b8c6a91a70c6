use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Round a weight to hundredths of a kilogram as an integer
pub fn hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Storage model for the last suggestion a user dismissed or applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachDismissal {
    pub user_id: String,
    /// Anchor: current-week average weight
    pub w_curr: f64,
    /// Anchor: previous-week average weight
    pub w_prev: f64,
    /// True when the suggestion was applied rather than dismissed
    pub applied: bool,
    pub recorded_at: DateTime<Utc>,
}

impl CoachDismissal {
    /// Whether this record was made against the given anchor
    pub fn matches(&self, w_curr: f64, w_prev: f64) -> bool {
        hundredths(self.w_curr) == hundredths(w_curr) && hundredths(self.w_prev) == hundredths(w_prev)
    }
}
