pub mod body_logs;
pub mod coach;
pub mod diet;
pub mod health;

// Re-export handlers for easier imports
pub use coach::{apply_suggestion, check_stagnation, dismiss_suggestion};
pub use health::health_check;
