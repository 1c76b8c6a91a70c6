use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Skinfold thicknesses in millimetres at the seven Pollock sites
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Skinfolds {
    #[validate(range(min = 0.0, max = 100.0, message = "Skinfolds must be between 0 and 100 mm"))]
    pub chest: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Skinfolds must be between 0 and 100 mm"))]
    pub axillary: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Skinfolds must be between 0 and 100 mm"))]
    pub triceps: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Skinfolds must be between 0 and 100 mm"))]
    pub subscapular: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Skinfolds must be between 0 and 100 mm"))]
    pub suprailiac: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Skinfolds must be between 0 and 100 mm"))]
    pub abdominal: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Skinfolds must be between 0 and 100 mm"))]
    pub thigh: Option<f64>,
}

impl Skinfolds {
    /// Sum of the seven sites, only when every site was measured
    pub fn complete_sum(&self) -> Option<f64> {
        [
            self.chest,
            self.axillary,
            self.triceps,
            self.subscapular,
            self.suprailiac,
            self.abdominal,
            self.thigh,
        ]
        .iter()
        .try_fold(0.0, |sum, site| site.map(|mm| sum + mm))
    }
}

/// Body circumferences in centimetres
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Circumferences {
    #[validate(range(min = 0.0, max = 300.0))]
    pub neck: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub shoulder: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub chest_relaxed: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub arm_relaxed_right: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub arm_relaxed_left: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub arm_contracted_right: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub arm_contracted_left: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub forearm_right: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub forearm_left: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub waist: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub abdomen: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub hips: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub thigh_proximal_right: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub thigh_proximal_left: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub calf_right: Option<f64>,
    #[validate(range(min = 0.0, max = 300.0))]
    pub calf_left: Option<f64>,
}

/// One user's body measurements for a calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct BodyLogEntry {
    pub id: String,

    pub user_id: String,

    /// Calendar day, unique per user
    #[cfg_attr(feature = "with-api", schema(value_type = String, format = Date, example = "2024-03-14"))]
    pub date: NaiveDate,

    /// Body weight in kilograms
    pub weight_kg: f64,

    /// Bioimpedance body fat percentage
    pub bio_body_fat_percent: Option<f64>,

    /// Bioimpedance muscle mass in kilograms
    pub bio_muscle_mass_kg: Option<f64>,

    pub skinfolds: Skinfolds,

    pub circumferences: Circumferences,

    /// Pollock 7-site density, present when all skinfolds were measured
    pub calculated_body_density: Option<f64>,

    /// Siri body fat percentage, present when all skinfolds were measured
    pub calculated_body_fat_percent: Option<f64>,
}

impl BodyLogEntry {
    /// Skinfold-derived body fat, falling back to bioimpedance
    pub fn body_fat_percent(&self) -> Option<f64> {
        self.calculated_body_fat_percent.or(self.bio_body_fat_percent)
    }

    /// Mean of the relaxed arm girths that were measured
    pub fn arm_girth_cm(&self) -> Option<f64> {
        let arms: Vec<f64> = [
            self.circumferences.arm_relaxed_right,
            self.circumferences.arm_relaxed_left,
        ]
        .into_iter()
        .flatten()
        .collect();

        if arms.is_empty() {
            None
        } else {
            Some(arms.iter().sum::<f64>() / arms.len() as f64)
        }
    }
}

/// Request payload for recording or replacing a day's measurements
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateBodyLogRequest {
    /// Owner of the log
    #[validate(length(min = 1, max = 128, message = "user_id must be between 1 and 128 characters"))]
    pub user_id: String,

    #[cfg_attr(feature = "with-api", schema(value_type = String, format = Date, example = "2024-03-14"))]
    pub date: NaiveDate,

    #[validate(range(min = 20.0, max = 400.0, message = "Weight must be between 20 and 400 kg"))]
    pub weight_kg: f64,

    #[validate(range(min = 0.0, max = 80.0, message = "Body fat must be between 0 and 80%"))]
    pub bio_body_fat_percent: Option<f64>,

    #[validate(range(min = 0.0, max = 200.0, message = "Muscle mass must be between 0 and 200 kg"))]
    pub bio_muscle_mass_kg: Option<f64>,

    #[serde(default)]
    #[validate]
    pub skinfolds: Skinfolds,

    #[serde(default)]
    #[validate]
    pub circumferences: Circumferences,
}
