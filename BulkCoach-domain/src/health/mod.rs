//! Domain layer health checks

use bulk_coach_data::database;
use std::collections::HashMap;
use async_trait::async_trait;

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    Healthy,
    /// Functional with reduced guarantees, e.g. running on in-memory storage
    Degraded,
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// A health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// The overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Component name to health
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    async fn get_system_health(&self) -> SystemHealth;

    /// Ok(true) when the database is fully operational, Ok(false) when degraded
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Check the database pool.
///
/// Returns Ok(false) when no pool was initialized and storage fell back to memory,
/// and an error when the pool exists but hands out no connection.
pub async fn check_database_status() -> Result<bool, String> {
    match database::get_connection_info() {
        Some(info) if info.contains("healthy") => Ok(true),
        Some(info) => Err(info),
        None => Ok(false),
    }
}

/// Health service backed by the global database pool
#[derive(Debug, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        HealthService
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let db_component = match self.check_database_status().await {
            Ok(true) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: database::get_connection_info(),
            },
            Ok(false) => HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("No database pool, data is kept in memory only".to_string()),
            },
            Err(e) => HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            },
        };

        let status = match db_component.status {
            ComponentStatus::Healthy => SystemStatus::Healthy,
            ComponentStatus::Degraded => SystemStatus::Degraded,
            ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
        };

        let mut components = HashMap::new();
        components.insert("database".to_string(), db_component);
        components.insert(
            "api".to_string(),
            HealthComponent {
                status: ComponentStatus::Healthy,
                details: None,
            },
        );

        SystemHealth { status, components }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        check_database_status().await
    }
}
