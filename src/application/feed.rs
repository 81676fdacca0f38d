use std::collections::BTreeSet;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::cache::CatalogCache;
use crate::domain::entities::{RatedFood, StandardFoodRecord};
use crate::domain::types::{FoodSpeed, FoodType};

/// Randomized, category-diversified sampling of the standard catalog.
#[derive(Clone)]
pub struct FeedSelector {
    cache: Arc<CatalogCache>,
}

impl FeedSelector {
    pub fn new(cache: Arc<CatalogCache>) -> Self {
        Self { cache }
    }

    /// Up to `count` foods of the given type and speed. Fewer (even none) is not an error.
    pub async fn get_feed(
        &self,
        food_type: FoodType,
        speed: FoodSpeed,
        count: usize,
    ) -> Vec<RatedFood> {
        let candidates = self
            .cache
            .read_all(|snapshot| {
                snapshot
                    .standard()
                    .iter()
                    .filter(|record| record.food_type == food_type && record.speed == speed)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;

        let available = candidates.len();
        let feed = select_diverse(candidates, count, &mut rand::rng());
        debug!(
            food_type = food_type.as_str(),
            speed = speed.as_str(),
            requested = count,
            available,
            returned = feed.len(),
            "Feed sampled"
        );
        feed
    }
}

/// Shuffle `candidates`, then greedily keep foods whose categories are all unseen.
/// Foods without categories are always eligible.
pub fn select_diverse<R: Rng + ?Sized>(
    mut candidates: Vec<StandardFoodRecord>,
    count: usize,
    rng: &mut R,
) -> Vec<RatedFood> {
    candidates.shuffle(rng);

    let mut used_categories = BTreeSet::new();
    let mut selected = Vec::with_capacity(count.min(candidates.len()));
    for record in candidates {
        if selected.len() >= count {
            break;
        }
        if record.shares_category_with(&used_categories) {
            continue;
        }
        used_categories.extend(record.categories.iter().cloned());
        selected.push(RatedFood::from(record));
    }
    selected
}
