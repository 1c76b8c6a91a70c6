// BulkCoach Data
// This crate handles persistence: the SQLite pool, migrations and repositories

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
