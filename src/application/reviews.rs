//! Meal reviews and the food statistics they feed.
//!
//! Only standard foods carry review counters, so custom foods tagged on a
//! review are stored with it but never reach [`StatsAggregator`].

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::application::foods::{ensure_non_empty, normalize_categories};
use crate::application::repos::{NewReview, ReviewContent, ReviewStore, StoreError};
use crate::application::stats::StatsAggregator;
use crate::domain::entities::{ReviewRecord, ReviewedFood};
use crate::domain::error::DomainError;
use crate::domain::types::{FoodSpeed, Rating};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("review `{review_id}` not found")]
    NotFound { review_id: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct ReviewCommand {
    pub name: String,
    pub foods: Vec<ReviewedFood>,
    pub speed: FoodSpeed,
    pub meal_time: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub comment: String,
    /// Absent for an unrated review.
    pub rating: Option<i32>,
}

/// A saved review and the background statistics update it started, if any.
#[derive(Debug)]
pub struct RecordedReview {
    pub review: ReviewRecord,
    pub stats_update: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    stats: StatsAggregator,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewStore>, stats: StatsAggregator) -> Self {
        Self { reviews, stats }
    }

    /// Save a review written by `user` on `day`, then count it towards its
    /// standard foods in the background.
    pub async fn create_review(
        &self,
        user: Uuid,
        day: i32,
        command: ReviewCommand,
    ) -> Result<RecordedReview, ReviewError> {
        ensure_day(day)?;
        let content = validate(command)?;

        let review = self
            .reviews
            .insert_review(NewReview {
                user_id: user,
                day,
                content,
            })
            .await?;

        let standard = review.standard_food_ids();
        let stats_update = (!standard.is_empty()).then(|| {
            self.stats
                .spawn_review_created(standard, review.rating.map(Rating::get))
        });

        info!(
            review_id = %review.id,
            user = %user,
            day,
            foods = review.foods.len(),
            "Review recorded"
        );
        Ok(RecordedReview {
            review,
            stats_update,
        })
    }

    /// Replace one of `user`'s reviews. A changed rating is shifted on the
    /// standard foods of the updated review.
    pub async fn update_review(
        &self,
        user: Uuid,
        review_id: Uuid,
        command: ReviewCommand,
    ) -> Result<RecordedReview, ReviewError> {
        let content = validate(command)?;

        let previous = self
            .reviews
            .find_review(review_id)
            .await?
            .filter(|review| review.user_id == user)
            .ok_or(ReviewError::NotFound { review_id })?;
        let review = self
            .reviews
            .update_review(review_id, content)
            .await?
            .ok_or(ReviewError::NotFound { review_id })?;

        let standard = review.standard_food_ids();
        let stats_update = (!standard.is_empty() && previous.rating != review.rating).then(|| {
            self.stats.spawn_review_edited(
                standard,
                previous.rating.map(Rating::get),
                review.rating.map(Rating::get),
            )
        });

        info!(review_id = %review.id, user = %user, "Review updated");
        Ok(RecordedReview {
            review,
            stats_update,
        })
    }

    pub async fn reviews_by_day(
        &self,
        user: Uuid,
        day: i32,
    ) -> Result<Vec<ReviewRecord>, ReviewError> {
        ensure_day(day)?;
        Ok(self.reviews.list_reviews_by_day(user, day).await?)
    }
}

fn ensure_day(day: i32) -> Result<(), DomainError> {
    if day < 1 {
        return Err(DomainError::validation(format!(
            "day must be at least 1, got {day}"
        )));
    }
    Ok(())
}

fn validate(command: ReviewCommand) -> Result<ReviewContent, DomainError> {
    let name = ensure_non_empty(&command.name, "name")?;
    let meal_time = ensure_non_empty(&command.meal_time, "meal_time")?;
    if command.foods.is_empty() {
        return Err(DomainError::validation("a review must tag at least one food"));
    }
    let rating = command.rating.map(Rating::try_from).transpose()?;

    Ok(ReviewContent {
        name,
        foods: command.foods,
        speed: command.speed,
        meal_time,
        tags: normalize_categories(command.tags),
        image_url: command.image_url.trim().to_string(),
        comment: command.comment.trim().to_string(),
        rating,
    })
}
