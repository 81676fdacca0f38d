use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CatalogStore, NewCustomFood, NewStandardFood, StoreError};
use crate::cache::CatalogCache;
use crate::domain::entities::{CustomFoodRecord, RatedFood};
use crate::domain::error::DomainError;
use crate::domain::types::{FoodSpeed, FoodType};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("food `{name}` already exists")]
    Duplicate { name: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct CreateStandardFoodCommand {
    pub name: String,
    pub image_url: String,
    pub speed: FoodSpeed,
    pub food_type: FoodType,
    pub categories: Vec<String>,
}

/// Explicit catalog maintenance: admin-created standard foods and
/// user-claimed custom foods.
#[derive(Clone)]
pub struct FoodCatalogService {
    store: Arc<dyn CatalogStore>,
    cache: Arc<CatalogCache>,
}

impl FoodCatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, cache: Arc<CatalogCache>) -> Self {
        Self { store, cache }
    }

    pub async fn create_standard(
        &self,
        command: CreateStandardFoodCommand,
    ) -> Result<RatedFood, CatalogError> {
        let name = ensure_non_empty(&command.name, "name")?;
        let image_url = ensure_non_empty(&command.image_url, "image_url")?;
        let categories = normalize_categories(command.categories);

        if self.store.find_standard_by_name(&name).await?.is_some() {
            return Err(CatalogError::Duplicate { name });
        }

        let record = self
            .store
            .insert_standard(NewStandardFood {
                name,
                image_url,
                speed: command.speed,
                food_type: command.food_type,
                categories,
            })
            .await?;
        self.cache.append_standard(record.clone()).await;

        info!(
            food_id = %record.id,
            name = %record.name,
            food_type = record.food_type.as_str(),
            speed = record.speed.as_str(),
            "Created standard food"
        );
        Ok(RatedFood::from(record))
    }

    /// Return the custom food named `name`, registering `user` as one of its users,
    /// or create it with `user` as the first.
    pub async fn find_or_create_custom(
        &self,
        name: &str,
        user: Uuid,
    ) -> Result<CustomFoodRecord, CatalogError> {
        let name = ensure_non_empty(name, "name")?;

        let Some(mut existing) = self.store.find_custom_by_name(&name).await? else {
            let record = self
                .store
                .insert_custom(NewCustomFood {
                    name,
                    first_user: user,
                })
                .await?;
            self.cache.append_custom(record.clone()).await;
            info!(food_id = %record.id, name = %record.name, "Created custom food");
            return Ok(record);
        };

        if self.store.add_user_to_custom(existing.id, user).await? {
            self.cache
                .mutate_custom(existing.id, |record| {
                    record.using_user_ids.insert(user);
                })
                .await;
            existing.using_user_ids.insert(user);
        }
        Ok(existing)
    }

    pub async fn get_standard(&self, id: Uuid) -> Result<Option<RatedFood>, CatalogError> {
        let record = self.store.find_standard_by_id(id).await?;
        Ok(record.map(RatedFood::from))
    }
}

pub(super) fn ensure_non_empty(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim entries, drop blanks and later duplicates, keep first-seen order.
pub(super) fn normalize_categories(categories: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        let category = category.trim();
        if category.is_empty() || normalized.iter().any(|seen| seen == category) {
            continue;
        }
        normalized.push(category.to_string());
    }
    normalized
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::infra::memory::{InMemoryCatalogStore, StoreOp};

    async fn service() -> (FoodCatalogService, Arc<InMemoryCatalogStore>, Arc<CatalogCache>) {
        let store = Arc::new(InMemoryCatalogStore::new());
        let cache = Arc::new(CatalogCache::load(store.as_ref()).await.expect("load"));
        (
            FoodCatalogService::new(store.clone(), cache.clone()),
            store,
            cache,
        )
    }

    fn command(name: &str) -> CreateStandardFoodCommand {
        CreateStandardFoodCommand {
            name: name.to_string(),
            image_url: "https://img.example/food.png".to_string(),
            speed: FoodSpeed::Fast,
            food_type: FoodType::Meal,
            categories: vec![
                " rice ".to_string(),
                "".to_string(),
                "korean".to_string(),
                "rice".to_string(),
            ],
        }
    }

    #[test]
    fn categories_are_trimmed_and_deduplicated() {
        let normalized = normalize_categories(vec![
            "b".into(),
            " a ".into(),
            "   ".into(),
            "b".into(),
        ]);
        assert_eq!(normalized, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn create_standard_persists_and_caches() {
        let (service, store, cache) = service().await;

        let created = service
            .create_standard(command("  비빔밥 "))
            .await
            .expect("created");

        assert_eq!(created.record.name, "비빔밥");
        assert_eq!(created.record.categories, vec!["rice", "korean"]);
        assert_eq!(created.record.like_count, 0);
        assert_eq!(created.average_rating, 0.0);
        assert!(store.standard(created.record.id).is_some());
        assert_eq!(cache.counts().await.standard, 1);
    }

    #[tokio::test]
    async fn create_standard_rejects_duplicates_and_blanks() {
        let (service, store, _) = service().await;
        service
            .create_standard(command("비빔밥"))
            .await
            .expect("first");

        let duplicate = service.create_standard(command("비빔밥")).await;
        assert!(matches!(duplicate, Err(CatalogError::Duplicate { .. })));

        let blank = service.create_standard(command("   ")).await;
        assert!(matches!(blank, Err(CatalogError::Validation(_))));
        assert_eq!(store.call_count(StoreOp::InsertStandard), 1);
    }

    #[tokio::test]
    async fn find_or_create_custom_adds_users_to_existing_food() {
        let (service, _, cache) = service().await;
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let created = service
            .find_or_create_custom("우리집 카레", alice)
            .await
            .expect("created");
        let found = service
            .find_or_create_custom("우리집 카레", bob)
            .await
            .expect("found");

        assert_eq!(created.id, found.id);
        assert_eq!(found.using_user_ids, BTreeSet::from([alice, bob]));
        let cached_users = cache
            .read_all(|snapshot| {
                snapshot
                    .find_custom(found.id)
                    .map(|record| record.using_user_ids.len())
            })
            .await;
        assert_eq!(cached_users, Some(2));
        assert_eq!(cache.counts().await.custom, 1);
    }

    #[tokio::test]
    async fn get_standard_reports_missing_as_none() {
        let (service, _, _) = service().await;
        let created = service
            .create_standard(command("냉면"))
            .await
            .expect("created");

        let found = service
            .get_standard(created.record.id)
            .await
            .expect("lookup");
        assert_eq!(found.map(|food| food.record.name), Some("냉면".to_string()));
        assert!(
            service
                .get_standard(Uuid::new_v4())
                .await
                .expect("lookup")
                .is_none()
        );
    }
}
