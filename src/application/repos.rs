//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{CustomFoodRecord, ReviewRecord, ReviewedFood, StandardFoodRecord};
use crate::domain::types::{FoodSpeed, FoodType, Rating};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewStandardFood {
    pub name: String,
    pub image_url: String,
    pub speed: FoodSpeed,
    pub food_type: FoodType,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewCustomFood {
    pub name: String,
    pub first_user: Uuid,
}

/// Editable review content shared by creation and update.
#[derive(Debug, Clone)]
pub struct ReviewContent {
    pub name: String,
    pub foods: Vec<ReviewedFood>,
    pub speed: FoodSpeed,
    pub meal_time: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub comment: String,
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub day: i32,
    pub content: ReviewContent,
}

/// Adjustment applied to the review counters of a set of standard foods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingDelta {
    pub review_count: i64,
    pub rating_sum: i64,
}

/// Durable lookup and mutation of both food catalogs.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_standard_by_id(&self, id: Uuid)
    -> Result<Option<StandardFoodRecord>, StoreError>;

    async fn find_standard_by_name(
        &self,
        name: &str,
    ) -> Result<Option<StandardFoodRecord>, StoreError>;

    async fn find_custom_by_name(&self, name: &str)
    -> Result<Option<CustomFoodRecord>, StoreError>;

    async fn list_all_standard(&self) -> Result<Vec<StandardFoodRecord>, StoreError>;

    async fn list_all_custom(&self) -> Result<Vec<CustomFoodRecord>, StoreError>;

    async fn insert_standard(
        &self,
        params: NewStandardFood,
    ) -> Result<StandardFoodRecord, StoreError>;

    async fn insert_custom(&self, params: NewCustomFood) -> Result<CustomFoodRecord, StoreError>;

    /// Adds `user` to the food's user set; `false` if the food is unknown.
    async fn add_user_to_custom(&self, food_id: Uuid, user: Uuid) -> Result<bool, StoreError>;

    /// Shifts the like counter, never below zero. Unknown ids are ignored.
    async fn increment_like(&self, food_id: Uuid, delta: i64) -> Result<(), StoreError>;

    /// Applies one delta to every listed standard food; unknown ids are ignored.
    async fn apply_rating_delta(&self, food_ids: &[Uuid], delta: RatingDelta)
    -> Result<(), StoreError>;
}

/// Per-user ledger of liked standard foods.
#[async_trait]
pub trait LikesStore: Send + Sync {
    /// Returns `true` when the like was newly recorded.
    async fn add_liked_food(&self, user: Uuid, food_id: Uuid) -> Result<bool, StoreError>;

    /// Returns `true` when an existing like was removed.
    async fn remove_liked_food(&self, user: Uuid, food_id: Uuid) -> Result<bool, StoreError>;

    async fn list_liked_foods(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError>;
}

/// Durable storage of meal reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, params: NewReview) -> Result<ReviewRecord, StoreError>;

    async fn find_review(&self, id: Uuid) -> Result<Option<ReviewRecord>, StoreError>;

    /// Replaces the content of review `id`; `None` if it does not exist.
    async fn update_review(
        &self,
        id: Uuid,
        content: ReviewContent,
    ) -> Result<Option<ReviewRecord>, StoreError>;

    /// Reviews `user` wrote on `day`, oldest first.
    async fn list_reviews_by_day(&self, user: Uuid, day: i32)
    -> Result<Vec<ReviewRecord>, StoreError>;
}
