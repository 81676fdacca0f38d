use std::collections::BTreeSet;
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::{CatalogStore, RatingDelta, StoreError};
use crate::cache::CatalogCache;
use crate::domain::types::{LikeDelta, Rating};

/// Keeps like and review counters consistent between the store and the cache.
///
/// Every update writes the store first and mirrors into the cache only after
/// the store accepted it.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn CatalogStore>,
    cache: Arc<CatalogCache>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn CatalogStore>, cache: Arc<CatalogCache>) -> Self {
        Self { store, cache }
    }

    /// Count a new review. Absent or out-of-range ratings leave the stats untouched.
    pub async fn on_review_created(
        &self,
        food_ids: &[Uuid],
        rating: Option<i32>,
    ) -> Result<(), StoreError> {
        let Some(rating) = Rating::accept(rating) else {
            debug!(?rating, "Review carries no usable rating; stats unchanged");
            return Ok(());
        };
        if food_ids.is_empty() {
            return Ok(());
        }

        self.apply(
            food_ids,
            RatingDelta {
                review_count: 1,
                rating_sum: i64::from(rating.get()),
            },
        )
        .await
    }

    /// Re-rate an existing review. A previously unrated review is counted as new.
    pub async fn on_review_edited(
        &self,
        food_ids: &[Uuid],
        old_rating: Option<i32>,
        new_rating: Option<i32>,
    ) -> Result<(), StoreError> {
        let Some(new_rating) = Rating::accept(new_rating) else {
            return Ok(());
        };
        if food_ids.is_empty() {
            return Ok(());
        }

        let delta = match Rating::accept(old_rating) {
            Some(old) if old == new_rating => return Ok(()),
            Some(old) => RatingDelta {
                review_count: 0,
                rating_sum: i64::from(new_rating.get() - old.get()),
            },
            None => RatingDelta {
                review_count: 1,
                rating_sum: i64::from(new_rating.get()),
            },
        };

        self.apply(food_ids, delta).await
    }

    pub async fn on_like_toggled(&self, food_id: Uuid, delta: LikeDelta) -> Result<(), StoreError> {
        let step = delta.value();
        self.store.increment_like(food_id, step).await?;
        let cached = self
            .cache
            .mutate_standard(food_id, |record| {
                record.like_count = (record.like_count + step).max(0);
            })
            .await;
        if !cached {
            debug!(food_id = %food_id, "Like toggled for a food missing from the cache");
        }
        Ok(())
    }

    /// Fire-and-forget [`StatsAggregator::on_review_created`]. Failures are logged, never retried.
    pub fn spawn_review_created(&self, food_ids: Vec<Uuid>, rating: Option<i32>) -> JoinHandle<()> {
        let stats = self.clone();
        tokio::spawn(async move {
            if let Err(err) = stats.on_review_created(&food_ids, rating).await {
                report_propagation_failure("review_created", &food_ids, &err);
            }
        })
    }

    /// Fire-and-forget [`StatsAggregator::on_review_edited`]. Failures are logged, never retried.
    pub fn spawn_review_edited(
        &self,
        food_ids: Vec<Uuid>,
        old_rating: Option<i32>,
        new_rating: Option<i32>,
    ) -> JoinHandle<()> {
        let stats = self.clone();
        tokio::spawn(async move {
            if let Err(err) = stats
                .on_review_edited(&food_ids, old_rating, new_rating)
                .await
            {
                report_propagation_failure("review_edited", &food_ids, &err);
            }
        })
    }

    async fn apply(&self, food_ids: &[Uuid], delta: RatingDelta) -> Result<(), StoreError> {
        // The store updates each row once, so the mirror must see each id once too.
        let food_ids: Vec<Uuid> = food_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        self.store.apply_rating_delta(&food_ids, delta).await?;
        let hits = self
            .cache
            .mutate_standard_each(&food_ids, |record| {
                record.review_count += delta.review_count;
                record.total_rating += delta.rating_sum;
            })
            .await;
        debug!(
            foods = food_ids.len(),
            cached = hits,
            review_delta = delta.review_count,
            rating_delta = delta.rating_sum,
            "Review stats applied"
        );
        Ok(())
    }
}

fn report_propagation_failure(event: &'static str, food_ids: &[Uuid], err: &StoreError) {
    counter!("bapddang_stats_propagation_failed_total", "event" => event).increment(1);
    warn!(
        event,
        foods = food_ids.len(),
        error = %err,
        "Review stats propagation failed; counters left unchanged"
    );
}
