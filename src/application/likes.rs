use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::{LikesStore, StoreError};
use crate::application::stats::StatsAggregator;
use crate::cache::CatalogCache;
use crate::domain::types::LikeDelta;

#[derive(Debug, Error)]
pub enum LikeError {
    #[error("unknown standard food `{food_id}`")]
    UnknownFood { food_id: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-user like ledger. Only real transitions reach the like counters, so a
/// repeated like or unlike is a successful no-op.
#[derive(Clone)]
pub struct LikeService {
    likes: Arc<dyn LikesStore>,
    cache: Arc<CatalogCache>,
    stats: StatsAggregator,
}

impl LikeService {
    pub fn new(likes: Arc<dyn LikesStore>, cache: Arc<CatalogCache>, stats: StatsAggregator) -> Self {
        Self {
            likes,
            cache,
            stats,
        }
    }

    /// Returns `true` when the like was newly recorded.
    pub async fn like(&self, user: Uuid, food_id: Uuid) -> Result<bool, LikeError> {
        self.ensure_known(food_id).await?;
        let added = self.likes.add_liked_food(user, food_id).await?;
        if added {
            if let Err(err) = self.stats.on_like_toggled(food_id, LikeDelta::Like).await {
                self.revert(user, food_id, LikeDelta::Like).await;
                return Err(err.into());
            }
        } else {
            debug!(user = %user, food_id = %food_id, "Duplicate like ignored");
        }
        Ok(added)
    }

    /// Returns `true` when an existing like was removed.
    pub async fn unlike(&self, user: Uuid, food_id: Uuid) -> Result<bool, LikeError> {
        self.ensure_known(food_id).await?;
        let removed = self.likes.remove_liked_food(user, food_id).await?;
        if removed {
            if let Err(err) = self.stats.on_like_toggled(food_id, LikeDelta::Unlike).await {
                self.revert(user, food_id, LikeDelta::Unlike).await;
                return Err(err.into());
            }
        } else {
            debug!(user = %user, food_id = %food_id, "Unlike without prior like ignored");
        }
        Ok(removed)
    }

    pub async fn liked_foods(&self, user: Uuid) -> Result<Vec<Uuid>, LikeError> {
        Ok(self.likes.list_liked_foods(user).await?)
    }

    /// Undo a ledger transition whose counter update failed.
    async fn revert(&self, user: Uuid, food_id: Uuid, applied: LikeDelta) {
        let reverted = match applied {
            LikeDelta::Like => self.likes.remove_liked_food(user, food_id).await,
            LikeDelta::Unlike => self.likes.add_liked_food(user, food_id).await,
        };
        if let Err(err) = reverted {
            warn!(
                user = %user,
                food_id = %food_id,
                delta = applied.value(),
                error = %err,
                "Like ledger could not be reverted; ledger and counter disagree"
            );
        }
    }

    async fn ensure_known(&self, food_id: Uuid) -> Result<(), LikeError> {
        let known = self
            .cache
            .read_all(|snapshot| snapshot.find_standard(food_id).is_some())
            .await;
        if known {
            Ok(())
        } else {
            Err(LikeError::UnknownFood { food_id })
        }
    }
}
