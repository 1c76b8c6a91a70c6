//! Jackson & Pollock 7-site body density with the Siri body fat equation

use serde::{Deserialize, Serialize};

use crate::entities::body_log::Skinfolds;

/// Highest body fat percentage the Siri conversion reports
pub const MAX_BODY_FAT_PERCENT: f64 = 60.0;

/// Density and body fat derived from a complete set of skinfolds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyFatEstimate {
    /// g/cm³, six decimals
    pub body_density: f64,
    /// Percent, two decimals, within 0..=60
    pub body_fat_percent: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Pollock 7-site density for a skinfold sum in mm
pub fn body_density(skinfold_sum_mm: f64, age_years: u32) -> f64 {
    let s = skinfold_sum_mm;
    let density = 1.112 - 0.00043499 * s + 0.00000055 * s * s - 0.00028826 * f64::from(age_years);
    round_to(density, 6)
}

/// Siri conversion of density to body fat percentage
pub fn siri_body_fat(density: f64) -> f64 {
    if density <= 0.0 {
        return 0.0;
    }
    round_to((495.0 / density - 450.0).clamp(0.0, MAX_BODY_FAT_PERCENT), 2)
}

/// Estimate body fat, only when all seven skinfolds were measured
pub fn estimate(skinfolds: &Skinfolds, age_years: u32) -> Option<BodyFatEstimate> {
    let sum = skinfolds.complete_sum()?;
    let body_density = body_density(sum, age_years);

    Some(BodyFatEstimate {
        body_density,
        body_fat_percent: siri_body_fat(body_density),
    })
}
