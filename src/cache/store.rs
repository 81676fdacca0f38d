//! Shared in-process mirror of the standard and custom catalogs.
//!
//! Readers scan under the shared lock. Writers mutate under the exclusive lock
//! and only after the backing store accepted the corresponding write, so the
//! mirror never advertises a record the store does not hold.

use std::time::{Duration, Instant};

use metrics::histogram;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{CatalogStore, StoreError};
use crate::domain::entities::{CustomFoodRecord, StandardFoodRecord};

use super::snapshot::{CatalogCounts, CatalogSnapshot};

const SOURCE: &str = "cache::store";

/// Exclusive access to the snapshot, held across a store write and the matching append.
pub type CatalogWriteGuard<'a> = RwLockWriteGuard<'a, CatalogSnapshot>;

/// Retry schedule for the initial catalog load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    snapshot: RwLock<CatalogSnapshot>,
}

impl CatalogCache {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Populate a cache from both catalogs in the store.
    pub async fn load(store: &dyn CatalogStore) -> Result<Self, StoreError> {
        let started = Instant::now();
        let (standard, custom) =
            tokio::try_join!(store.list_all_standard(), store.list_all_custom())?;

        let snapshot = CatalogSnapshot::new(standard, custom);
        let counts = snapshot.counts();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("bapddang_catalog_load_ms").record(elapsed_ms);

        info!(
            target = SOURCE,
            standard = counts.standard,
            custom = counts.custom,
            elapsed_ms,
            "Catalog cache loaded"
        );

        Ok(Self::new(snapshot))
    }

    /// [`CatalogCache::load`] with exponential backoff; returns the last error once
    /// every attempt failed.
    pub async fn load_with_retry(
        store: &dyn CatalogStore,
        policy: LoadPolicy,
    ) -> Result<Self, StoreError> {
        let attempts = policy.attempts.max(1);
        let mut backoff = policy.initial_backoff;
        let mut attempt = 1;

        loop {
            match Self::load(store).await {
                Ok(cache) => return Ok(cache),
                Err(err) if attempt < attempts => {
                    warn!(
                        target = SOURCE,
                        attempt,
                        attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Catalog load failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn read_all<R>(&self, f: impl FnOnce(&CatalogSnapshot) -> R) -> R {
        let guard = self.snapshot.read().await;
        f(&guard)
    }

    pub async fn write(&self) -> CatalogWriteGuard<'_> {
        self.snapshot.write().await
    }

    pub async fn append_standard(&self, record: StandardFoodRecord) {
        self.snapshot.write().await.push_standard(record);
    }

    pub async fn append_custom(&self, record: CustomFoodRecord) {
        self.snapshot.write().await.push_custom(record);
    }

    /// Apply `f` to the cached standard food `id`. Returns `false` on a miss.
    pub async fn mutate_standard(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut StandardFoodRecord),
    ) -> bool {
        let mut guard = self.snapshot.write().await;
        match guard.standard_mut(id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Apply `f` to the cached custom food `id`. Returns `false` on a miss.
    pub async fn mutate_custom(&self, id: Uuid, f: impl FnOnce(&mut CustomFoodRecord)) -> bool {
        let mut guard = self.snapshot.write().await;
        match guard.custom_mut(id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Apply `f` to every listed standard food under a single exclusive lock.
    /// Returns how many ids were found.
    pub async fn mutate_standard_each(
        &self,
        ids: &[Uuid],
        mut f: impl FnMut(&mut StandardFoodRecord),
    ) -> usize {
        let mut guard = self.snapshot.write().await;
        let mut hits = 0;
        for id in ids {
            if let Some(record) = guard.standard_mut(*id) {
                f(record);
                hits += 1;
            }
        }
        hits
    }

    pub async fn counts(&self) -> CatalogCounts {
        self.snapshot.read().await.counts()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::{FoodSpeed, FoodType};
    use crate::infra::memory::{InMemoryCatalogStore, StoreOp};

    fn standard(name: &str) -> StandardFoodRecord {
        StandardFoodRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: format!("https://img.example/{name}.png"),
            speed: FoodSpeed::Fast,
            food_type: FoodType::Meal,
            categories: Vec::new(),
            like_count: 0,
            review_count: 0,
            total_rating: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn quick_policy(attempts: u32) -> LoadPolicy {
        LoadPolicy {
            attempts,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn load_mirrors_both_catalogs() {
        let store = InMemoryCatalogStore::new();
        store.seed_standard(standard("김밥"));
        store.seed_standard(standard("라면"));

        let cache = CatalogCache::load(&store).await.expect("load");
        let counts = cache.counts().await;
        assert_eq!(counts.standard, 2);
        assert_eq!(counts.custom, 0);
    }

    #[tokio::test]
    async fn load_with_retry_recovers_from_transient_failure() {
        let store = InMemoryCatalogStore::new();
        store.seed_standard(standard("김밥"));
        store.fail_next(StoreOp::ListAllStandard);

        let cache = CatalogCache::load_with_retry(&store, quick_policy(3))
            .await
            .expect("second attempt succeeds");
        assert_eq!(cache.counts().await.standard, 1);
    }

    #[tokio::test]
    async fn load_with_retry_surfaces_last_error() {
        let store = InMemoryCatalogStore::new();
        store.fail_next(StoreOp::ListAllCustom);

        let result = CatalogCache::load_with_retry(&store, quick_policy(1)).await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
    }

    #[tokio::test]
    async fn mutate_on_unknown_id_is_silent_noop() {
        let cache = CatalogCache::default();
        let touched = cache
            .mutate_standard(Uuid::new_v4(), |record| record.like_count += 1)
            .await;
        assert!(!touched);
        let touched = cache
            .mutate_custom(Uuid::new_v4(), |record| {
                record.using_user_ids.insert(Uuid::nil());
            })
            .await;
        assert!(!touched);
    }

    #[tokio::test]
    async fn mutate_standard_each_counts_hits() {
        let known = standard("떡볶이");
        let known_id = known.id;
        let cache = CatalogCache::new(CatalogSnapshot::new(vec![known], Vec::new()));

        let hits = cache
            .mutate_standard_each(&[known_id, Uuid::new_v4()], |record| {
                record.review_count += 1;
            })
            .await;
        assert_eq!(hits, 1);

        let review_count = cache
            .read_all(|snapshot| snapshot.find_standard(known_id).map(|r| r.review_count))
            .await;
        assert_eq!(review_count, Some(1));
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_visible() {
        let cache = Arc::new(CatalogCache::default());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.append_standard(standard(&format!("음식{i}"))).await;
            }));
        }
        for handle in handles {
            handle.await.expect("join");
        }
        assert_eq!(cache.counts().await.standard, 16);
    }
}
