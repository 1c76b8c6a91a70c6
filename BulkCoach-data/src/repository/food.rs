use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::food::{CreateFoodItemRequest, FoodItem};
use super::backend::StorageBackend;
use super::errors::RepositoryError;
use super::storage::DatabaseStorage;

/// Repository trait for the food catalogue
#[async_trait]
pub trait FoodRepositoryTrait: Send + Sync {
    async fn create(&self, request: CreateFoodItemRequest) -> Result<FoodItem, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<FoodItem>, RepositoryError>;

    /// Foods ordered by name, filtered by a case-insensitive name fragment when given
    async fn list(&self, search: Option<String>) -> Result<Vec<FoodItem>, RepositoryError>;

    /// Delete a food and every meal item that uses it
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;
}

#[derive(Debug, Clone)]
pub struct FoodRepository {
    backend: StorageBackend,
}

impl FoodRepository {
    pub fn new(backend: StorageBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl FoodRepositoryTrait for FoodRepository {
    async fn create(&self, request: CreateFoodItemRequest) -> Result<FoodItem, RepositoryError> {
        let food = FoodItem {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            brand: request.brand,
            calories_kcal: request.calories_kcal,
            protein_g: request.protein_g,
            carbs_g: request.carbs_g,
            fat_g: request.fat_g,
            created_at: Utc::now(),
        };

        match &self.backend {
            StorageBackend::Database(pool) => {
                DatabaseStorage::insert_food(pool, &food).await?;
                Ok(food)
            }
            StorageBackend::InMemory(storage) => storage.insert_food(food).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FoodItem>, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::get_food(pool, id).await,
            StorageBackend::InMemory(storage) => storage.get_food(id).await,
        }
    }

    async fn list(&self, search: Option<String>) -> Result<Vec<FoodItem>, RepositoryError> {
        let search = search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::list_foods(pool, search).await,
            StorageBackend::InMemory(storage) => storage.list_foods(search).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        match &self.backend {
            StorageBackend::Database(pool) => DatabaseStorage::delete_food(pool, id).await,
            StorageBackend::InMemory(storage) => storage.delete_food(id).await,
        }
    }
}
