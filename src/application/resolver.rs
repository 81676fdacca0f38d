//! Resolution of free-text food names against both catalogs.
//!
//! Each submitted name ends in exactly one of three outcomes: an exact hit in
//! the store (`ok`), a ranked list of close cached names (`suggestion`), or a
//! freshly registered custom food (`new`).

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::repos::{CatalogStore, NewCustomFood, StoreError};
use crate::cache::{CatalogCache, CatalogSnapshot};
use crate::domain::entities::FoodRef;
use crate::domain::error::DomainError;
use crate::domain::similarity;
use crate::domain::types::FoodKind;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.75;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    pub similarity_threshold: f64,
    pub max_suggestions: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub score: f64,
    pub id: Uuid,
    pub name: String,
    pub kind: FoodKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub original_name: String,
    #[serde(flatten)]
    pub outcome: ResolutionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResolutionOutcome {
    Ok {
        #[serde(rename = "match")]
        food: FoodRef,
    },
    Suggestion {
        suggestions: Vec<MatchCandidate>,
    },
    New {
        #[serde(rename = "newEntry")]
        entry: FoodRef,
    },
}

impl ResolutionOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            ResolutionOutcome::Ok { .. } => "ok",
            ResolutionOutcome::Suggestion { .. } => "suggestion",
            ResolutionOutcome::New { .. } => "new",
        }
    }
}

#[derive(Clone)]
pub struct NameResolver {
    store: Arc<dyn CatalogStore>,
    cache: Arc<CatalogCache>,
    config: ResolverConfig,
}

impl NameResolver {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<CatalogCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Resolve every name in input order on behalf of `user`.
    ///
    /// Not transactional: a store failure aborts the batch while registrations
    /// made for earlier names stay committed.
    pub async fn resolve_names(
        &self,
        names: &[String],
        user: Uuid,
    ) -> Result<Vec<Resolution>, ResolveError> {
        validate_batch(names)?;

        let started = Instant::now();
        let mut resolutions = Vec::with_capacity(names.len());
        for name in names {
            let outcome = self.resolve_one(name, user).await?;
            counter!("bapddang_resolve_total", "status" => outcome.status()).increment(1);
            resolutions.push(Resolution {
                original_name: name.clone(),
                outcome,
            });
        }
        histogram!("bapddang_resolve_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        Ok(resolutions)
    }

    async fn resolve_one(&self, name: &str, user: Uuid) -> Result<ResolutionOutcome, StoreError> {
        // Exact lookups compare the literal text; only the fuzzy pass normalizes.
        if let Some(found) = self.store.find_standard_by_name(name).await? {
            return Ok(ResolutionOutcome::Ok {
                food: found.food_ref(),
            });
        }
        if let Some(found) = self.store.find_custom_by_name(name).await? {
            return Ok(ResolutionOutcome::Ok {
                food: found.food_ref(),
            });
        }

        let suggestions = self
            .cache
            .read_all(|snapshot| rank_candidates(snapshot, name, &self.config))
            .await;

        if suggestions.is_empty() {
            let entry = self.register_custom(name, user).await?;
            return Ok(ResolutionOutcome::New { entry });
        }

        debug!(
            name,
            candidates = suggestions.len(),
            best = suggestions[0].score,
            "Name resolved to suggestions"
        );
        Ok(ResolutionOutcome::Suggestion { suggestions })
    }

    async fn register_custom(&self, name: &str, user: Uuid) -> Result<FoodRef, StoreError> {
        // The exclusive guard spans insert and append so no reader sees the
        // store and cache disagree about this record.
        // TODO: repeat find_custom_by_name under the guard so two concurrent
        // batches cannot both register the same unknown name.
        let mut snapshot = self.cache.write().await;
        let record = self
            .store
            .insert_custom(NewCustomFood {
                name: name.to_string(),
                first_user: user,
            })
            .await?;
        let entry = record.food_ref();
        snapshot.push_custom(record);
        drop(snapshot);

        info!(food_id = %entry.id, name, user = %user, "Registered new custom food");
        Ok(entry)
    }
}

fn validate_batch(names: &[String]) -> Result<(), DomainError> {
    if names.is_empty() {
        return Err(DomainError::validation("at least one food name is required"));
    }
    if let Some(position) = names.iter().position(|name| name.trim().is_empty()) {
        return Err(DomainError::validation(format!(
            "food name at position {position} is blank"
        )));
    }
    Ok(())
}

/// Score `name` against every cached standard then custom entry, keeping those at or
/// above the threshold, best first. Equal scores keep catalog order.
pub fn rank_candidates(
    snapshot: &CatalogSnapshot,
    name: &str,
    config: &ResolverConfig,
) -> Vec<MatchCandidate> {
    let standard = snapshot
        .standard()
        .iter()
        .map(|record| (record.id, record.name.as_str(), FoodKind::Standard));
    let custom = snapshot
        .custom()
        .iter()
        .map(|record| (record.id, record.name.as_str(), FoodKind::Custom));

    let mut candidates: Vec<MatchCandidate> = standard
        .chain(custom)
        .filter_map(|(id, candidate, kind)| {
            let score = similarity::score(name, candidate);
            (score >= config.similarity_threshold).then(|| MatchCandidate {
                score,
                id,
                name: candidate.to_string(),
                kind,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(config.max_suggestions);
    candidates
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use time::OffsetDateTime;

    use super::*;
    use crate::domain::entities::{CustomFoodRecord, StandardFoodRecord};
    use crate::domain::types::{FoodSpeed, FoodType};
    use crate::infra::memory::{InMemoryCatalogStore, StoreOp};

    fn standard(name: &str) -> StandardFoodRecord {
        StandardFoodRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: String::new(),
            speed: FoodSpeed::Slow,
            food_type: FoodType::Meal,
            categories: Vec::new(),
            like_count: 0,
            review_count: 0,
            total_rating: 0,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn custom(name: &str) -> CustomFoodRecord {
        CustomFoodRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            using_user_ids: BTreeSet::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    async fn resolver_with(
        standard_foods: Vec<StandardFoodRecord>,
        custom_foods: Vec<CustomFoodRecord>,
    ) -> (NameResolver, Arc<InMemoryCatalogStore>, Arc<CatalogCache>) {
        let store = Arc::new(InMemoryCatalogStore::new());
        for record in standard_foods {
            store.seed_standard(record);
        }
        for record in custom_foods {
            store.seed_custom(record);
        }
        let cache = Arc::new(CatalogCache::load(store.as_ref()).await.expect("load"));
        let resolver = NameResolver::new(store.clone(), cache.clone(), ResolverConfig::default());
        (resolver, store, cache)
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn ranking_is_stable_and_truncated() {
        let snapshot = CatalogSnapshot::new(
            vec![standard("김치찌개"), standard("김치찌개 ")],
            vec![custom("김치 찌개"), custom("김치찌게")],
        );
        let ranked = rank_candidates(&snapshot, "김치찌개", &ResolverConfig::default());

        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|pair| pair[0].score >= pair[1].score));
        // The three perfect scores keep catalog order: standard first.
        assert_eq!(ranked[0].kind, FoodKind::Standard);
        assert_eq!(ranked[1].kind, FoodKind::Standard);
        assert_eq!(ranked[2].kind, FoodKind::Custom);
        assert_eq!(ranked[2].name, "김치 찌개");
    }

    #[test]
    fn ranking_respects_threshold() {
        let snapshot = CatalogSnapshot::new(vec![standard("초코케이크")], Vec::new());
        let config = ResolverConfig::default();
        assert!(rank_candidates(&snapshot, "된장찌개", &config).is_empty());
    }

    #[tokio::test]
    async fn exact_standard_name_is_ok() {
        let food = standard("된장찌개");
        let id = food.id;
        let (resolver, store, _) = resolver_with(vec![food], Vec::new()).await;

        let result = resolver
            .resolve_names(&names(&["된장찌개"]), Uuid::new_v4())
            .await
            .expect("resolve");

        assert_eq!(result[0].outcome.status(), "ok");
        match &result[0].outcome {
            ResolutionOutcome::Ok { food } => {
                assert_eq!(food.id, id);
                assert_eq!(food.kind, FoodKind::Standard);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.call_count(StoreOp::FindCustomByName), 0);
    }

    #[tokio::test]
    async fn exact_custom_name_is_ok_without_adding_user() {
        let food = custom("엄마표 김밥");
        let id = food.id;
        let (resolver, store, _) = resolver_with(Vec::new(), vec![food]).await;

        let result = resolver
            .resolve_names(&names(&["엄마표 김밥"]), Uuid::new_v4())
            .await
            .expect("resolve");

        assert!(matches!(
            &result[0].outcome,
            ResolutionOutcome::Ok { food } if food.id == id && food.kind == FoodKind::Custom
        ));
        assert_eq!(store.call_count(StoreOp::AddUserToCustom), 0);
        assert_eq!(store.call_count(StoreOp::InsertCustom), 0);
    }

    #[tokio::test]
    async fn near_miss_returns_suggestions_without_registering() {
        let (resolver, store, cache) = resolver_with(vec![standard("된장찌개")], Vec::new()).await;

        let result = resolver
            .resolve_names(&names(&["된장뛔개"]), Uuid::new_v4())
            .await
            .expect("resolve");

        match &result[0].outcome {
            ResolutionOutcome::Suggestion { suggestions } => {
                assert_eq!(suggestions.len(), 1);
                assert_eq!(suggestions[0].name, "된장찌개");
                assert!(suggestions[0].score >= DEFAULT_SIMILARITY_THRESHOLD);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.call_count(StoreOp::InsertCustom), 0);
        assert_eq!(cache.counts().await.custom, 0);
    }

    #[tokio::test]
    async fn unknown_name_is_registered_for_user() {
        let (resolver, store, cache) = resolver_with(vec![standard("된장찌개")], Vec::new()).await;
        let user = Uuid::new_v4();

        let result = resolver
            .resolve_names(&names(&["완전히다른음식이름"]), user)
            .await
            .expect("resolve");

        let entry = match &result[0].outcome {
            ResolutionOutcome::New { entry } => entry.clone(),
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(entry.kind, FoodKind::Custom);

        let stored = store.custom_named("완전히다른음식이름");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, entry.id);
        assert!(stored[0].using_user_ids.contains(&user));

        let cached_users = cache
            .read_all(|snapshot| {
                snapshot
                    .find_custom(entry.id)
                    .map(|record| record.using_user_ids.clone())
            })
            .await;
        assert_eq!(cached_users, Some(BTreeSet::from([user])));
    }

    #[tokio::test]
    async fn repeated_resolution_is_idempotent_by_name() {
        let (resolver, store, _) = resolver_with(Vec::new(), Vec::new()).await;
        let user = Uuid::new_v4();

        let first = resolver
            .resolve_names(&names(&["할머니 수제비"]), user)
            .await
            .expect("first");
        let second = resolver
            .resolve_names(&names(&["할머니 수제비"]), user)
            .await
            .expect("second");

        assert_eq!(first[0].outcome.status(), "new");
        assert_eq!(second[0].outcome.status(), "ok");
        assert_eq!(store.custom_named("할머니 수제비").len(), 1);
    }

    #[tokio::test]
    async fn duplicate_name_within_one_batch_registers_once() {
        let (resolver, store, cache) = resolver_with(Vec::new(), Vec::new()).await;
        let user = Uuid::new_v4();

        let result = resolver
            .resolve_names(&names(&["새메뉴", "새메뉴"]), user)
            .await
            .expect("resolve");

        let statuses: Vec<_> = result.iter().map(|r| r.outcome.status()).collect();
        assert_eq!(statuses, vec!["new", "ok"]);
        let (registered, matched) = match (&result[0].outcome, &result[1].outcome) {
            (ResolutionOutcome::New { entry }, ResolutionOutcome::Ok { food }) => (entry, food),
            other => panic!("unexpected outcomes: {other:?}"),
        };
        assert_eq!(registered.id, matched.id);
        assert_eq!(store.custom_named("새메뉴").len(), 1);
        assert_eq!(cache.counts().await.custom, 1);
    }

    #[tokio::test]
    async fn empty_batch_and_blank_names_are_rejected() {
        let (resolver, store, _) = resolver_with(Vec::new(), Vec::new()).await;

        let empty = resolver.resolve_names(&[], Uuid::new_v4()).await;
        assert!(matches!(empty, Err(ResolveError::Validation(_))));

        let blank = resolver
            .resolve_names(&names(&["김밥", "  "]), Uuid::new_v4())
            .await;
        assert!(matches!(blank, Err(ResolveError::Validation(_))));
        assert_eq!(store.call_count(StoreOp::FindStandardByName), 0);
    }

    #[tokio::test]
    async fn store_failure_aborts_but_keeps_earlier_registrations() {
        let (resolver, store, cache) = resolver_with(Vec::new(), Vec::new()).await;
        let user = Uuid::new_v4();

        // First name registers; the lookup for the second one fails.
        resolver
            .resolve_names(&names(&["첫번째음식"]), user)
            .await
            .expect("warm");
        store.fail_next(StoreOp::FindStandardByName);
        let result = resolver
            .resolve_names(&names(&["두번째음식"]), user)
            .await;

        assert!(matches!(result, Err(ResolveError::Store(_))));
        assert_eq!(store.custom_named("첫번째음식").len(), 1);
        assert_eq!(cache.counts().await.custom, 1);
    }

    #[tokio::test]
    async fn failed_registration_leaves_cache_untouched() {
        let (resolver, store, cache) = resolver_with(Vec::new(), Vec::new()).await;
        store.fail_next(StoreOp::InsertCustom);

        let result = resolver
            .resolve_names(&names(&["새로운음식"]), Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(ResolveError::Store(_))));
        assert_eq!(cache.counts().await.custom, 0);
    }

    #[test]
    fn resolution_serializes_with_status_tag() {
        let entry = FoodRef {
            id: Uuid::nil(),
            name: "비빔밥".to_string(),
            kind: FoodKind::Custom,
        };
        let resolution = Resolution {
            original_name: "비빔밥".to_string(),
            outcome: ResolutionOutcome::New { entry },
        };

        let value = serde_json::to_value(&resolution).expect("serialize");
        assert_eq!(value["status"], "new");
        assert_eq!(value["originalName"], "비빔밥");
        assert_eq!(value["newEntry"]["kind"], "custom");
        assert!(value.get("match").is_none());
    }
}
