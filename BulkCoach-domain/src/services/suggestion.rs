//! Turns a weight trend into a coaching verdict

use crate::config::CoachConfig;
use crate::entities::body_log::BodyLogEntry;
use crate::entities::coaching::{round1, round2, AnalysisState, CoachingVerdict, DismissalRecord, TrendResult};
use crate::entities::diet::DietPlan;

/// Grams of carbohydrate added or removed per kg of current-week body weight
pub const CARB_ADJUSTMENT_G_PER_KG: f64 = 0.5;

/// Energy per gram of carbohydrate
pub const KCAL_PER_G_CARB: f64 = 4.0;

/// Signed (calories, carbs) adjustment for a trend state, zero when on target
pub fn adjustment_for(state: AnalysisState, current_avg_weight: f64) -> (f64, f64) {
    let carbs = round1(current_avg_weight * CARB_ADJUSTMENT_G_PER_KG);
    let calories = round1(carbs * KCAL_PER_G_CARB);

    match state {
        AnalysisState::Optimal => (0.0, 0.0),
        AnalysisState::WeightLoss | AnalysisState::SlowGain => (calories, carbs),
        AnalysisState::HighVelocity => (-calories, -carbs),
    }
}

/// Coaching message for a trend state.
///
/// A non-optimal state that is not stagnating can only come from a matching
/// dismissal, so it gets the "already adjusted" message.
pub fn message_for(state: AnalysisState, is_stagnating: bool, suggest_cutting: bool) -> String {
    let base = match (state, is_stagnating) {
        (AnalysisState::Optimal, _) => "Weight gain is on target. Keep following the current plan.",
        (_, false) => "Your plan was already adjusted for this trend. Keep logging your weight and check back once new weigh-ins are in.",
        (AnalysisState::WeightLoss, true) => "Your weight is trending down. Increase your calories to get the bulk back on track.",
        (AnalysisState::SlowGain, true) => "Your weight gain has stalled. Increase your calories to keep gaining.",
        (AnalysisState::HighVelocity, true) => "Your weight is climbing faster than planned. Reduce your calories to limit fat gain.",
    };

    if suggest_cutting {
        format!("{} Your body composition suggests it may be time to start a cutting phase.", base)
    } else {
        base.to_string()
    }
}

/// Change of a measurement between the earliest and latest entries that have it
fn change_over_window(entries: &[&BodyLogEntry], value: impl Fn(&BodyLogEntry) -> Option<f64>) -> Option<f64> {
    let points: Vec<f64> = entries.iter().filter_map(|e| value(e)).collect();
    if points.len() < 2 {
        return None;
    }
    Some(points[points.len() - 1] - points[0])
}

#[derive(Debug, Clone, PartialEq)]
struct CuttingCheck {
    reasons: Vec<String>,
    body_fat_percent: Option<f64>,
    waist_change_cm: Option<f64>,
    arm_change_cm: Option<f64>,
}

fn check_cutting(recent: &[BodyLogEntry], config: &CoachConfig) -> CuttingCheck {
    let mut entries: Vec<&BodyLogEntry> = recent.iter().collect();
    entries.sort_by_key(|e| e.date);

    let body_fat_percent = entries.iter().rev().find_map(|e| e.body_fat_percent());
    let waist_change_cm = change_over_window(&entries, |e| e.circumferences.waist);
    let arm_change_cm = change_over_window(&entries, BodyLogEntry::arm_girth_cm);

    let mut reasons = Vec::new();

    if let Some(body_fat) = body_fat_percent {
        if body_fat > config.body_fat_ceiling_percent {
            reasons.push(format!(
                "Body fat is {:.1}%, above the {:.1}% ceiling for bulking",
                body_fat, config.body_fat_ceiling_percent
            ));
        }
    }

    if let (Some(waist), Some(arm)) = (waist_change_cm, arm_change_cm) {
        if waist > config.waist_gain_cm && arm <= config.arm_tolerance_cm {
            reasons.push(format!(
                "Waist grew {:.1} cm while arm girth changed {:.1} cm",
                waist, arm
            ));
        }
    }

    CuttingCheck {
        reasons,
        body_fat_percent,
        waist_change_cm: waist_change_cm.map(round2),
        arm_change_cm: arm_change_cm.map(round2),
    }
}

/// Decide whether to surface an adjustment for a trend.
///
/// `recent` are the body logs the trend was computed from; they feed the cutting
/// checks. Without a plan the adjustment is still computed but no targets are
/// reported. Pure: nothing is read or written.
pub fn evaluate(
    trend: &TrendResult,
    plan: Option<&DietPlan>,
    recent: &[BodyLogEntry],
    last_dismissal: Option<&DismissalRecord>,
    config: &CoachConfig,
) -> CoachingVerdict {
    let anchor = trend.anchor();
    let already_adjusted = last_dismissal
        .map(|dismissal| dismissal.anchor.matches(&anchor))
        .unwrap_or(false);
    let is_stagnating = trend.analysis_state != AnalysisState::Optimal && !already_adjusted;

    let (calorie_adjustment, carb_adjustment) = if is_stagnating {
        adjustment_for(trend.analysis_state, trend.current_week_avg_weight)
    } else {
        (0.0, 0.0)
    };

    let cutting = check_cutting(recent, config);
    let suggest_cutting = !cutting.reasons.is_empty();

    let current_avg = trend.current_week_avg_weight;
    let per_kg = |grams: f64| if current_avg > 0.0 { Some(round2(grams / current_avg)) } else { None };

    let current_calories = plan.map(|p| p.target_calories);
    let current_carbs_g = plan.map(|p| p.target_carbs);
    let (suggested_calories, suggested_carbs_g) = match plan {
        Some(p) if is_stagnating => (
            Some(round1(p.target_calories + calorie_adjustment)),
            Some(round1(p.target_carbs + carb_adjustment)),
        ),
        _ => (None, None),
    };

    CoachingVerdict {
        trend: trend.clone(),
        anchor,
        is_stagnating,
        already_adjusted,
        message: message_for(trend.analysis_state, is_stagnating, suggest_cutting),
        suggest_cutting,
        cutting_reasons: cutting.reasons,
        current_body_fat_percent: cutting.body_fat_percent,
        waist_change_cm: cutting.waist_change_cm,
        arm_change_cm: cutting.arm_change_cm,
        suggested_calorie_adjustment: calorie_adjustment,
        suggested_carb_adjustment_g: carb_adjustment,
        current_calories,
        suggested_calories,
        current_carbs_g,
        suggested_carbs_g,
        current_carbs_per_kg: current_carbs_g.and_then(per_kg),
        suggested_carbs_per_kg: suggested_carbs_g.and_then(per_kg),
        new_target_calories: suggested_calories,
        new_target_carbs: suggested_carbs_g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::coaching::Anchor;
    use crate::services::trend::analyze;
    use crate::testing::fixtures::{as_of, entry_days_ago, sample_plan, trend_with};
    use chrono::Utc;

    fn dismissal(w_curr: f64, w_prev: f64) -> DismissalRecord {
        DismissalRecord {
            user_id: "user-1".to_string(),
            anchor: Anchor::new(w_curr, w_prev),
            applied: false,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_flat_weight_suggests_increase() {
        let history: Vec<BodyLogEntry> = (0..14).map(|d| entry_days_ago(d, 85.0)).collect();
        let trend = analyze(&history, as_of()).unwrap();
        let plan = sample_plan(3000.0, 350.0);

        let verdict = evaluate(&trend, Some(&plan), &history, None, &CoachConfig::default());

        assert_eq!(trend.analysis_state, AnalysisState::SlowGain);
        assert!(verdict.is_stagnating);
        assert!(!verdict.already_adjusted);
        assert_eq!(verdict.suggested_carb_adjustment_g, 42.5);
        assert_eq!(verdict.suggested_calorie_adjustment, 170.0);
        assert_eq!(verdict.new_target_carbs, Some(392.5));
        assert_eq!(verdict.new_target_calories, Some(3170.0));
        assert_eq!(verdict.current_carbs_per_kg, Some(4.12));
        assert_eq!(verdict.suggested_carbs_per_kg, Some(4.62));
    }

    #[test]
    fn test_high_velocity_suggests_reduction() {
        let trend = trend_with(AnalysisState::HighVelocity, 82.0, 80.5);
        let plan = sample_plan(3200.0, 400.0);

        let verdict = evaluate(&trend, Some(&plan), &[], None, &CoachConfig::default());

        assert!(verdict.is_stagnating);
        assert_eq!(verdict.suggested_carb_adjustment_g, -41.0);
        assert_eq!(verdict.suggested_calorie_adjustment, -164.0);
        assert_eq!(verdict.new_target_carbs, Some(359.0));
        assert_eq!(verdict.new_target_calories, Some(3036.0));
    }

    #[test]
    fn test_optimal_trend_is_left_alone() {
        let trend = trend_with(AnalysisState::Optimal, 80.3, 80.0);
        let plan = sample_plan(3000.0, 350.0);

        let verdict = evaluate(&trend, Some(&plan), &[], None, &CoachConfig::default());

        assert!(!verdict.is_stagnating);
        assert_eq!(verdict.suggested_calorie_adjustment, 0.0);
        assert_eq!(verdict.suggested_carb_adjustment_g, 0.0);
        assert_eq!(verdict.new_target_calories, None);
        assert_eq!(verdict.current_calories, Some(3000.0));
    }

    #[test]
    fn test_matching_dismissal_suppresses_suggestion() {
        let trend = trend_with(AnalysisState::SlowGain, 80.0, 79.5);
        let record = dismissal(80.0, 79.5);

        let verdict = evaluate(&trend, None, &[], Some(&record), &CoachConfig::default());

        assert!(!verdict.is_stagnating);
        assert!(verdict.already_adjusted);
        assert_eq!(verdict.suggested_calorie_adjustment, 0.0);
        assert!(verdict.message.contains("already adjusted"));
    }

    #[test]
    fn test_moved_anchor_is_not_suppressed() {
        let trend = trend_with(AnalysisState::SlowGain, 80.2, 79.5);
        let record = dismissal(80.0, 79.5);

        let verdict = evaluate(&trend, None, &[], Some(&record), &CoachConfig::default());

        assert!(verdict.is_stagnating);
        assert!(!verdict.already_adjusted);
        assert_eq!(verdict.suggested_carb_adjustment_g, 40.1);
        assert_eq!(verdict.suggested_calorie_adjustment, 160.4);
    }

    #[test]
    fn test_without_plan_targets_are_absent() {
        let trend = trend_with(AnalysisState::WeightLoss, 79.0, 79.6);
        let verdict = evaluate(&trend, None, &[], None, &CoachConfig::default());

        assert!(verdict.is_stagnating);
        assert_eq!(verdict.suggested_carb_adjustment_g, 39.5);
        assert_eq!(verdict.current_calories, None);
        assert_eq!(verdict.new_target_carbs, None);
        assert_eq!(verdict.current_carbs_per_kg, None);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let history: Vec<BodyLogEntry> = (0..14).map(|d| entry_days_ago(d, 80.0 + d as f64 * 0.01)).collect();
        let trend = analyze(&history, as_of()).unwrap();
        let plan = sample_plan(3000.0, 350.0);
        let record = dismissal(70.0, 70.0);
        let config = CoachConfig::default();

        let first = evaluate(&trend, Some(&plan), &history, Some(&record), &config);
        let second = evaluate(&trend, Some(&plan), &history, Some(&record), &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_body_fat_above_ceiling_suggests_cutting() {
        let trend = trend_with(AnalysisState::Optimal, 80.3, 80.0);
        let mut older = entry_days_ago(5, 80.0);
        older.calculated_body_fat_percent = Some(19.0);
        let mut latest = entry_days_ago(1, 80.3);
        latest.bio_body_fat_percent = Some(21.5);

        let verdict = evaluate(&trend, None, &[latest, older], None, &CoachConfig::default());

        assert!(verdict.suggest_cutting);
        assert_eq!(verdict.current_body_fat_percent, Some(21.5));
        assert_eq!(verdict.cutting_reasons.len(), 1);
        assert!(verdict.message.contains("cutting phase"));
        assert!(!verdict.is_stagnating);
    }

    #[test]
    fn test_waist_growth_without_arm_growth_suggests_cutting() {
        let trend = trend_with(AnalysisState::HighVelocity, 82.0, 80.5);
        let mut first = entry_days_ago(12, 80.5);
        first.circumferences.waist = Some(84.0);
        first.circumferences.arm_relaxed_right = Some(37.0);
        first.circumferences.arm_relaxed_left = Some(36.8);
        let mut middle = entry_days_ago(6, 81.2);
        middle.circumferences.arm_relaxed_right = Some(37.2);
        let mut last = entry_days_ago(0, 82.0);
        last.circumferences.waist = Some(86.5);
        last.circumferences.arm_relaxed_right = Some(37.0);
        last.circumferences.arm_relaxed_left = Some(36.9);

        let verdict = evaluate(&trend, None, &[last, middle, first], None, &CoachConfig::default());

        assert_eq!(verdict.waist_change_cm, Some(2.5));
        assert_eq!(verdict.arm_change_cm, Some(0.05));
        assert!(verdict.suggest_cutting);
        assert_eq!(verdict.cutting_reasons.len(), 1);
        assert!(verdict.cutting_reasons[0].contains("Waist"));
    }

    #[test]
    fn test_waist_growth_with_arm_growth_is_fine() {
        let trend = trend_with(AnalysisState::Optimal, 81.0, 80.5);
        let mut first = entry_days_ago(10, 80.5);
        first.circumferences.waist = Some(84.0);
        first.circumferences.arm_relaxed_left = Some(36.0);
        let mut last = entry_days_ago(0, 81.0);
        last.circumferences.waist = Some(86.5);
        last.circumferences.arm_relaxed_left = Some(36.6);

        let verdict = evaluate(&trend, None, &[first, last], None, &CoachConfig::default());

        assert!(!verdict.suggest_cutting);
        assert!(verdict.cutting_reasons.is_empty());
    }

    #[test]
    fn test_single_measurement_skips_change_checks() {
        let trend = trend_with(AnalysisState::Optimal, 81.0, 80.5);
        let mut only = entry_days_ago(0, 81.0);
        only.circumferences.waist = Some(90.0);
        only.circumferences.arm_relaxed_left = Some(36.0);

        let verdict = evaluate(&trend, None, &[only], None, &CoachConfig::default());

        assert_eq!(verdict.waist_change_cm, None);
        assert_eq!(verdict.arm_change_cm, None);
        assert!(!verdict.suggest_cutting);
    }

    #[test]
    fn test_messages_carry_no_numbers() {
        let states = [
            AnalysisState::WeightLoss,
            AnalysisState::SlowGain,
            AnalysisState::Optimal,
            AnalysisState::HighVelocity,
        ];
        for state in states {
            for stagnating in [true, false] {
                for cutting in [true, false] {
                    let message = message_for(state, stagnating, cutting);
                    assert!(!message.chars().any(|c| c.is_ascii_digit()), "{}", message);
                }
            }
        }
    }
}
