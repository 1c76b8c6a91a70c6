// BulkCoach Domain
// Trend analysis, coaching decisions and diet arithmetic for the BulkCoach application

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Environment driven settings
pub mod config;

// Source of "today" for the analysis window
pub mod clock;

// Re-export the database module from the data layer for convenience
pub use bulk_coach_data::database;

// Fixtures and mock services
#[cfg(any(test, feature = "mock"))]
pub mod testing;
