//! In-process store used by tests and local experiments.
//!
//! Every operation can be made to fail exactly once through
//! [`InMemoryCatalogStore::fail_next`], which is how propagation and retry
//! paths are exercised without a database.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CatalogStore, LikesStore, NewCustomFood, NewReview, NewStandardFood, RatingDelta,
    ReviewContent, ReviewStore, StoreError,
};
use crate::domain::entities::{CustomFoodRecord, ReviewRecord, StandardFoodRecord};
use crate::util::lock::mutex_lock;

const SOURCE: &str = "infra::memory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindStandardById,
    FindStandardByName,
    FindCustomByName,
    ListAllStandard,
    ListAllCustom,
    InsertStandard,
    InsertCustom,
    AddUserToCustom,
    IncrementLike,
    ApplyRatingDelta,
    AddLikedFood,
    RemoveLikedFood,
    ListLikedFoods,
    InsertReview,
    FindReview,
    UpdateReview,
    ListReviewsByDay,
}

#[derive(Debug, Default)]
struct MemoryState {
    standard: Vec<StandardFoodRecord>,
    custom: Vec<CustomFoodRecord>,
    likes: BTreeSet<(Uuid, Uuid)>,
    reviews: Vec<ReviewRecord>,
    pending_failures: HashSet<StoreOp>,
    calls: HashMap<StoreOp, usize>,
}

impl MemoryState {
    /// Record the call and consume a pending failure for `op`, if any.
    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.entry(op).or_default() += 1;
        if self.pending_failures.remove(&op) {
            return Err(StoreError::from_persistence(format!(
                "injected failure for {op:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: Mutex<MemoryState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_standard(&self, record: StandardFoodRecord) {
        mutex_lock(&self.state, SOURCE, "seed_standard")
            .standard
            .push(record);
    }

    pub fn seed_custom(&self, record: CustomFoodRecord) {
        mutex_lock(&self.state, SOURCE, "seed_custom")
            .custom
            .push(record);
    }

    /// Make the next call of `op` fail with a persistence error.
    pub fn fail_next(&self, op: StoreOp) {
        mutex_lock(&self.state, SOURCE, "fail_next")
            .pending_failures
            .insert(op);
    }

    pub fn call_count(&self, op: StoreOp) -> usize {
        mutex_lock(&self.state, SOURCE, "call_count")
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    pub fn standard(&self, id: Uuid) -> Option<StandardFoodRecord> {
        mutex_lock(&self.state, SOURCE, "standard")
            .standard
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn custom_named(&self, name: &str) -> Vec<CustomFoodRecord> {
        mutex_lock(&self.state, SOURCE, "custom_named")
            .custom
            .iter()
            .filter(|record| record.name == name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_standard_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<StandardFoodRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "find_standard_by_id");
        state.enter(StoreOp::FindStandardById)?;
        Ok(state.standard.iter().find(|record| record.id == id).cloned())
    }

    async fn find_standard_by_name(
        &self,
        name: &str,
    ) -> Result<Option<StandardFoodRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "find_standard_by_name");
        state.enter(StoreOp::FindStandardByName)?;
        Ok(state
            .standard
            .iter()
            .find(|record| record.name == name)
            .cloned())
    }

    async fn find_custom_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CustomFoodRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "find_custom_by_name");
        state.enter(StoreOp::FindCustomByName)?;
        Ok(state
            .custom
            .iter()
            .find(|record| record.name == name)
            .cloned())
    }

    async fn list_all_standard(&self) -> Result<Vec<StandardFoodRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "list_all_standard");
        state.enter(StoreOp::ListAllStandard)?;
        Ok(state.standard.clone())
    }

    async fn list_all_custom(&self) -> Result<Vec<CustomFoodRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "list_all_custom");
        state.enter(StoreOp::ListAllCustom)?;
        Ok(state.custom.clone())
    }

    async fn insert_standard(
        &self,
        params: NewStandardFood,
    ) -> Result<StandardFoodRecord, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "insert_standard");
        state.enter(StoreOp::InsertStandard)?;
        if state.standard.iter().any(|record| record.name == params.name) {
            return Err(StoreError::Duplicate {
                constraint: "standard_foods_name_key".to_string(),
            });
        }

        let record = StandardFoodRecord {
            id: Uuid::new_v4(),
            name: params.name,
            image_url: params.image_url,
            speed: params.speed,
            food_type: params.food_type,
            categories: params.categories,
            like_count: 0,
            review_count: 0,
            total_rating: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        state.standard.push(record.clone());
        Ok(record)
    }

    async fn insert_custom(&self, params: NewCustomFood) -> Result<CustomFoodRecord, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "insert_custom");
        state.enter(StoreOp::InsertCustom)?;
        if state.custom.iter().any(|record| record.name == params.name) {
            return Err(StoreError::Duplicate {
                constraint: "custom_foods_name_key".to_string(),
            });
        }

        let record = CustomFoodRecord {
            id: Uuid::new_v4(),
            name: params.name,
            using_user_ids: BTreeSet::from([params.first_user]),
            created_at: OffsetDateTime::now_utc(),
        };
        state.custom.push(record.clone());
        Ok(record)
    }

    async fn add_user_to_custom(&self, food_id: Uuid, user: Uuid) -> Result<bool, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "add_user_to_custom");
        state.enter(StoreOp::AddUserToCustom)?;
        match state.custom.iter_mut().find(|record| record.id == food_id) {
            Some(record) => {
                record.using_user_ids.insert(user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_like(&self, food_id: Uuid, delta: i64) -> Result<(), StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "increment_like");
        state.enter(StoreOp::IncrementLike)?;
        if let Some(record) = state.standard.iter_mut().find(|record| record.id == food_id) {
            record.like_count = (record.like_count + delta).max(0);
        }
        Ok(())
    }

    async fn apply_rating_delta(
        &self,
        food_ids: &[Uuid],
        delta: RatingDelta,
    ) -> Result<(), StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "apply_rating_delta");
        state.enter(StoreOp::ApplyRatingDelta)?;
        for record in state
            .standard
            .iter_mut()
            .filter(|record| food_ids.contains(&record.id))
        {
            record.review_count += delta.review_count;
            record.total_rating += delta.rating_sum;
        }
        Ok(())
    }
}

#[async_trait]
impl LikesStore for InMemoryCatalogStore {
    async fn add_liked_food(&self, user: Uuid, food_id: Uuid) -> Result<bool, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "add_liked_food");
        state.enter(StoreOp::AddLikedFood)?;
        Ok(state.likes.insert((user, food_id)))
    }

    async fn remove_liked_food(&self, user: Uuid, food_id: Uuid) -> Result<bool, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "remove_liked_food");
        state.enter(StoreOp::RemoveLikedFood)?;
        Ok(state.likes.remove(&(user, food_id)))
    }

    async fn list_liked_foods(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "list_liked_foods");
        state.enter(StoreOp::ListLikedFoods)?;
        Ok(state
            .likes
            .iter()
            .filter(|(owner, _)| *owner == user)
            .map(|(_, food_id)| *food_id)
            .collect())
    }
}

#[async_trait]
impl ReviewStore for InMemoryCatalogStore {
    async fn insert_review(&self, params: NewReview) -> Result<ReviewRecord, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "insert_review");
        state.enter(StoreOp::InsertReview)?;

        let now = OffsetDateTime::now_utc();
        let ReviewContent {
            name,
            foods,
            speed,
            meal_time,
            tags,
            image_url,
            comment,
            rating,
        } = params.content;
        let record = ReviewRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            name,
            foods,
            speed,
            meal_time,
            tags,
            image_url,
            comment,
            rating,
            day: params.day,
            created_at: now,
            updated_at: now,
        };
        state.reviews.push(record.clone());
        Ok(record)
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<ReviewRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "find_review");
        state.enter(StoreOp::FindReview)?;
        Ok(state.reviews.iter().find(|review| review.id == id).cloned())
    }

    async fn update_review(
        &self,
        id: Uuid,
        content: ReviewContent,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "update_review");
        state.enter(StoreOp::UpdateReview)?;
        let Some(review) = state.reviews.iter_mut().find(|review| review.id == id) else {
            return Ok(None);
        };

        review.name = content.name;
        review.foods = content.foods;
        review.speed = content.speed;
        review.meal_time = content.meal_time;
        review.tags = content.tags;
        review.image_url = content.image_url;
        review.comment = content.comment;
        review.rating = content.rating;
        review.updated_at = OffsetDateTime::now_utc();
        Ok(Some(review.clone()))
    }

    async fn list_reviews_by_day(
        &self,
        user: Uuid,
        day: i32,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut state = mutex_lock(&self.state, SOURCE, "list_reviews_by_day");
        state.enter(StoreOp::ListReviewsByDay)?;
        Ok(state
            .reviews
            .iter()
            .filter(|review| review.user_id == user && review.day == day)
            .cloned()
            .collect())
    }
}
