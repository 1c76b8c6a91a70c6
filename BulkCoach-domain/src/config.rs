//! Coaching configuration loaded from the environment

use std::env;
use tracing::{info, warn};

/// Thresholds used by the suggestion engine and the body-fat formula
#[derive(Debug, Clone, PartialEq)]
pub struct CoachConfig {
    /// Body fat percentage above which a cutting phase is suggested
    pub body_fat_ceiling_percent: f64,
    /// Waist growth in cm that, with flat arms, suggests cutting
    pub waist_gain_cm: f64,
    /// Arm change in cm at or below which arms count as flat
    pub arm_tolerance_cm: f64,
    /// Age used by the Pollock density formula
    pub subject_age_years: u32,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            body_fat_ceiling_percent: 20.0,
            waist_gain_cm: 2.0,
            arm_tolerance_cm: 0.2,
            subject_age_years: 25,
        }
    }
}

impl CoachConfig {
    /// Read `COACH_*` variables, keeping the default for any that are unset or malformed
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            body_fat_ceiling_percent: parse_env_or("COACH_BODY_FAT_CEILING", defaults.body_fat_ceiling_percent),
            waist_gain_cm: parse_env_or("COACH_WAIST_GAIN_CM", defaults.waist_gain_cm),
            arm_tolerance_cm: parse_env_or("COACH_ARM_TOLERANCE_CM", defaults.arm_tolerance_cm),
            subject_age_years: parse_env_or("COACH_SUBJECT_AGE", defaults.subject_age_years),
        };

        info!(
            "Coach configuration: body_fat_ceiling={}%, waist_gain={}cm, arm_tolerance={}cm, age={}",
            config.body_fat_ceiling_percent,
            config.waist_gain_cm,
            config.arm_tolerance_cm,
            config.subject_age_years
        );

        config
    }
}

fn parse_env_or<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoachConfig::default();
        assert_eq!(config.body_fat_ceiling_percent, 20.0);
        assert_eq!(config.waist_gain_cm, 2.0);
        assert_eq!(config.arm_tolerance_cm, 0.2);
        assert_eq!(config.subject_age_years, 25);
    }

    #[test]
    fn test_invalid_value_falls_back() {
        env::set_var("COACH_TEST_ONLY_VALUE", "not-a-number");
        assert_eq!(parse_env_or("COACH_TEST_ONLY_VALUE", 1.5), 1.5);

        env::set_var("COACH_TEST_ONLY_VALUE", " 3.25 ");
        assert_eq!(parse_env_or("COACH_TEST_ONLY_VALUE", 1.5), 3.25);
        env::remove_var("COACH_TEST_ONLY_VALUE");
    }
}
