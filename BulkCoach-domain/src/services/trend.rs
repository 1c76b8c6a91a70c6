//! Weight trend analysis over the last two weeks of body logs

use chrono::NaiveDate;
use thiserror::Error;

use crate::entities::body_log::BodyLogEntry;
use crate::entities::coaching::{AnalysisState, TrendResult};

/// Days of history the analysis looks at, ending on `as_of`
pub const ANALYSIS_WINDOW_DAYS: u32 = 14;

/// Days per partition
const WEEK_DAYS: i64 = 7;

/// Average weeks per month
pub const WEEKS_PER_MONTH: f64 = 365.25 / 12.0 / 7.0;

/// Projected monthly gain below which the trend is too slow
pub const SLOW_GAIN_MONTHLY_KG: f64 = 0.5;

/// Projected monthly gain above which the trend is too fast
pub const HIGH_VELOCITY_MONTHLY_KG: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrendError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// A weigh-in placed relative to `as_of`
#[derive(Debug, Clone, Copy)]
struct Point {
    /// Whole days before `as_of`, 0 for `as_of` itself
    days_ago: i64,
    weight_kg: f64,
    date: NaiveDate,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    sum / count as f64
}

/// Classify a weekly rate and its monthly projection, first match wins
pub fn classify(weekly_rate: f64, monthly_projection: f64) -> AnalysisState {
    if weekly_rate < 0.0 {
        AnalysisState::WeightLoss
    } else if monthly_projection < SLOW_GAIN_MONTHLY_KG {
        AnalysisState::SlowGain
    } else if monthly_projection <= HIGH_VELOCITY_MONTHLY_KG {
        AnalysisState::Optimal
    } else {
        AnalysisState::HighVelocity
    }
}

/// Compare the average weight of the last 7 days with the 7 days before.
///
/// Entries outside `as_of - 13 ..= as_of` are ignored and input order does not
/// matter. When one week has no entry, the entry of the other week closest to it
/// is moved across. Time between the partitions is measured between their mean
/// days, so uneven logging does not distort the weekly rate.
pub fn analyze(history: &[BodyLogEntry], as_of: NaiveDate) -> Result<TrendResult, TrendError> {
    let window = i64::from(ANALYSIS_WINDOW_DAYS);

    let mut points: Vec<Point> = history
        .iter()
        .map(|entry| Point {
            days_ago: (as_of - entry.date).num_days(),
            weight_kg: entry.weight_kg,
            date: entry.date,
        })
        .filter(|p| (0..window).contains(&p.days_ago))
        .collect();

    // Newest first
    points.sort_by_key(|p| p.days_ago);

    let mut distinct_dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    distinct_dates.dedup();
    if distinct_dates.len() < 2 {
        return Err(TrendError::InsufficientData(format!(
            "at least two weigh-ins on different days within the last {} days are needed",
            ANALYSIS_WINDOW_DAYS
        )));
    }

    let (mut current, mut previous): (Vec<Point>, Vec<Point>) =
        points.iter().copied().partition(|p| p.days_ago < WEEK_DAYS);

    if current.is_empty() {
        // Most recent entry of the previous week
        current.push(previous.remove(0));
    } else if previous.is_empty() {
        // Oldest entry of the current week
        if let Some(oldest) = current.pop() {
            previous.push(oldest);
        }
    }

    let current_avg = mean(current.iter().map(|p| p.weight_kg));
    let previous_avg = mean(previous.iter().map(|p| p.weight_kg));

    let current_mean_days_ago = mean(current.iter().map(|p| p.days_ago as f64));
    let previous_mean_days_ago = mean(previous.iter().map(|p| p.days_ago as f64));
    let weeks_elapsed = (previous_mean_days_ago - current_mean_days_ago) / WEEK_DAYS as f64;

    if !weeks_elapsed.is_finite() || weeks_elapsed <= 0.0 {
        return Err(TrendError::InsufficientData(
            "weigh-ins are too close together to measure a trend".to_string(),
        ));
    }

    let weight_change_kg = current_avg - previous_avg;
    let weekly_rate = weight_change_kg / weeks_elapsed;
    let monthly_projection = weekly_rate * WEEKS_PER_MONTH;

    let latest = points[0];

    Ok(TrendResult {
        current_week_avg_weight: current_avg,
        previous_week_avg_weight: previous_avg,
        weight_change_kg,
        weekly_rate,
        monthly_projection,
        weeks_elapsed,
        analysis_state: classify(weekly_rate, monthly_projection),
        anchor_date: latest.date,
        anchor_weight_kg: latest.weight_kg,
        current_week_entries: current.len(),
        previous_week_entries: previous.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{as_of, entry_days_ago};

    fn daily(weights_oldest_first: &[f64]) -> Vec<BodyLogEntry> {
        let n = weights_oldest_first.len() as i64;
        weights_oldest_first
            .iter()
            .enumerate()
            .map(|(i, w)| entry_days_ago(n - 1 - i as i64, *w))
            .collect()
    }

    #[test]
    fn test_constant_weight_is_slow_gain() {
        let history = daily(&[80.0; 14]);
        let trend = analyze(&history, as_of()).unwrap();

        assert_eq!(trend.weekly_rate, 0.0);
        assert_eq!(trend.monthly_projection, 0.0);
        assert_eq!(trend.analysis_state, AnalysisState::SlowGain);
        assert_eq!(trend.current_week_entries, 7);
        assert_eq!(trend.previous_week_entries, 7);
    }

    #[test]
    fn test_fast_gain_is_high_velocity() {
        let mut weights = vec![80.0; 7];
        weights.extend([81.5; 7]);
        let trend = analyze(&daily(&weights), as_of()).unwrap();

        assert!((trend.weeks_elapsed - 1.0).abs() < 1e-9);
        assert!((trend.weekly_rate - 1.5).abs() < 1e-9);
        assert!((trend.monthly_projection - 6.52).abs() < 0.01);
        assert_eq!(trend.analysis_state, AnalysisState::HighVelocity);
    }

    #[test]
    fn test_moderate_gain_is_optimal() {
        let mut weights = vec![80.0; 7];
        weights.extend([80.3; 7]);
        let trend = analyze(&daily(&weights), as_of()).unwrap();

        assert!((trend.weight_change_kg - 0.3).abs() < 1e-9);
        assert!((trend.weeks_elapsed - 1.0).abs() < 1e-9);
        assert!((trend.weekly_rate - 0.3).abs() < 1e-9);
        assert!((trend.monthly_projection - 1.30).abs() < 0.01);
        assert_eq!(trend.analysis_state, AnalysisState::Optimal);
        assert_eq!(trend.anchor().w_curr, 80.3);
        assert_eq!(trend.anchor().w_prev, 80.0);
    }

    #[test]
    fn test_loss_is_weight_loss() {
        let mut weights = vec![81.0; 7];
        weights.extend([80.6; 7]);
        let trend = analyze(&daily(&weights), as_of()).unwrap();
        assert_eq!(trend.analysis_state, AnalysisState::WeightLoss);
    }

    #[test]
    fn test_single_entry_is_insufficient() {
        let history = vec![entry_days_ago(0, 80.0)];
        assert!(matches!(analyze(&history, as_of()), Err(TrendError::InsufficientData(_))));
        assert!(matches!(analyze(&[], as_of()), Err(TrendError::InsufficientData(_))));
    }

    #[test]
    fn test_entries_outside_window_are_ignored() {
        let history = vec![
            entry_days_ago(20, 70.0),
            entry_days_ago(14, 70.0),
            entry_days_ago(-1, 95.0),
            entry_days_ago(10, 80.0),
            entry_days_ago(3, 80.5),
        ];
        let trend = analyze(&history, as_of()).unwrap();

        assert_eq!(trend.previous_week_avg_weight, 80.0);
        assert_eq!(trend.current_week_avg_weight, 80.5);
        assert_eq!(trend.anchor_date, entry_days_ago(3, 0.0).date);
        assert_eq!(trend.anchor_weight_kg, 80.5);
        assert!((trend.weeks_elapsed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut history = daily(&[80.0, 80.1, 80.1, 80.2, 80.3, 80.2, 80.4, 80.5, 80.5, 80.6]);
        let forward = analyze(&history, as_of()).unwrap();
        history.reverse();
        let backward = analyze(&history, as_of()).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_empty_current_week_borrows_latest_previous_entry() {
        let history = vec![
            entry_days_ago(8, 80.4),
            entry_days_ago(10, 80.2),
            entry_days_ago(12, 80.0),
        ];
        let trend = analyze(&history, as_of()).unwrap();

        assert_eq!(trend.current_week_entries, 1);
        assert_eq!(trend.previous_week_entries, 2);
        assert_eq!(trend.current_week_avg_weight, 80.4);
        assert!((trend.previous_week_avg_weight - 80.1).abs() < 1e-9);
        // mean days ago 11 vs 8
        assert!((trend.weeks_elapsed - 3.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_previous_week_borrows_oldest_current_entry() {
        let history = vec![
            entry_days_ago(0, 80.6),
            entry_days_ago(2, 80.5),
            entry_days_ago(6, 80.0),
        ];
        let trend = analyze(&history, as_of()).unwrap();

        assert_eq!(trend.current_week_entries, 2);
        assert_eq!(trend.previous_week_entries, 1);
        assert_eq!(trend.previous_week_avg_weight, 80.0);
        assert!((trend.current_week_avg_weight - 80.55).abs() < 1e-9);
        // mean days ago 6 vs 1
        assert!((trend.weeks_elapsed - 5.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(-0.01, -0.04), AnalysisState::WeightLoss);
        assert_eq!(classify(0.0, 0.0), AnalysisState::SlowGain);
        assert_eq!(classify(0.1, 0.49), AnalysisState::SlowGain);
        assert_eq!(classify(0.2, 0.5), AnalysisState::Optimal);
        assert_eq!(classify(0.3, 1.5), AnalysisState::Optimal);
        assert_eq!(classify(0.4, 1.51), AnalysisState::HighVelocity);
    }
}
