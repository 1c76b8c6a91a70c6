// Storage models
pub mod body_log;
pub mod diet_plan;
pub mod dismissal;
pub mod food;
