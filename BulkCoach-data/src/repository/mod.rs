// Repository module structure
pub mod errors;
mod backend;
mod body_log;
mod diet_plan;
mod dismissal;
mod food;
mod in_memory;
mod storage;

#[cfg(test)]
mod repository_tests;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use backend::StorageBackend;
pub use in_memory::InMemoryStorage;
pub use body_log::{BodyLogRepository, BodyLogRepositoryTrait};
pub use diet_plan::{DietPlanRepository, DietPlanRepositoryTrait};
pub use dismissal::{DismissalRepository, DismissalRepositoryTrait};
pub use food::{FoodRepository, FoodRepositoryTrait};

// Re-export test modules for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub use body_log::tests;
