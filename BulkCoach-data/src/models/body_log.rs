use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

/// Skinfold thicknesses in millimetres, seven Pollock sites
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skinfolds {
    pub chest: Option<f64>,
    pub axillary: Option<f64>,
    pub triceps: Option<f64>,
    pub subscapular: Option<f64>,
    pub suprailiac: Option<f64>,
    pub abdominal: Option<f64>,
    pub thigh: Option<f64>,
}

impl Skinfolds {
    /// All seven sites in a fixed order
    pub fn sites(&self) -> [Option<f64>; 7] {
        [
            self.chest,
            self.axillary,
            self.triceps,
            self.subscapular,
            self.suprailiac,
            self.abdominal,
            self.thigh,
        ]
    }
}

/// Body circumferences in centimetres
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circumferences {
    pub neck: Option<f64>,
    pub shoulder: Option<f64>,
    pub chest_relaxed: Option<f64>,
    pub arm_relaxed_right: Option<f64>,
    pub arm_relaxed_left: Option<f64>,
    pub arm_contracted_right: Option<f64>,
    pub arm_contracted_left: Option<f64>,
    pub forearm_right: Option<f64>,
    pub forearm_left: Option<f64>,
    pub waist: Option<f64>,
    pub abdomen: Option<f64>,
    pub hips: Option<f64>,
    pub thigh_proximal_right: Option<f64>,
    pub thigh_proximal_left: Option<f64>,
    pub calf_right: Option<f64>,
    pub calf_left: Option<f64>,
}

/// Storage model for a daily body log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyLog {
    /// Unique identifier for the log
    pub id: String,

    /// Owner of the log
    pub user_id: String,

    /// Calendar day of the measurement, unique per user
    pub date: NaiveDate,

    /// Body weight in kilograms
    pub weight_kg: f64,

    /// Bioimpedance body fat percentage
    pub bio_body_fat_percent: Option<f64>,

    /// Bioimpedance muscle mass in kilograms
    pub bio_muscle_mass_kg: Option<f64>,

    pub skinfolds: Skinfolds,

    pub circumferences: Circumferences,

    /// Body density derived from the skinfolds
    pub calculated_body_density: Option<f64>,

    /// Body fat percentage derived from the skinfolds
    pub calculated_body_fat_percent: Option<f64>,

    /// When the log was first stored
    pub created_at: DateTime<Utc>,
}

/// Input data for creating or replacing a body log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBodyLogRequest {
    pub user_id: String,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub bio_body_fat_percent: Option<f64>,
    pub bio_muscle_mass_kg: Option<f64>,
    pub skinfolds: Skinfolds,
    pub circumferences: Circumferences,
    pub calculated_body_density: Option<f64>,
    pub calculated_body_fat_percent: Option<f64>,
}

impl BodyLog {
    /// Build a fresh log from a request
    pub fn from_request(id: String, request: CreateBodyLogRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: request.user_id,
            date: request.date,
            weight_kg: request.weight_kg,
            bio_body_fat_percent: request.bio_body_fat_percent,
            bio_muscle_mass_kg: request.bio_muscle_mass_kg,
            skinfolds: request.skinfolds,
            circumferences: request.circumferences,
            calculated_body_density: request.calculated_body_density,
            calculated_body_fat_percent: request.calculated_body_fat_percent,
            created_at,
        }
    }
}
