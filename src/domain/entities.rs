//! Domain entities mirrored from persistent storage.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::types::{FoodKind, FoodSpeed, FoodType, Rating};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardFoodRecord {
    pub id: Uuid,
    pub name: String,
    pub image_url: String,
    pub speed: FoodSpeed,
    #[serde(rename = "type")]
    pub food_type: FoodType,
    pub categories: Vec<String>,
    pub like_count: i64,
    pub review_count: i64,
    pub total_rating: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StandardFoodRecord {
    /// Mean of all rated reviews, or `0.0` before the first one.
    pub fn average_rating(&self) -> f64 {
        if self.review_count > 0 {
            self.total_rating as f64 / self.review_count as f64
        } else {
            0.0
        }
    }

    pub fn food_ref(&self) -> FoodRef {
        FoodRef {
            id: self.id,
            name: self.name.clone(),
            kind: FoodKind::Standard,
        }
    }

    /// Whether any of this food's categories is already in `used`.
    pub fn shares_category_with(&self, used: &BTreeSet<String>) -> bool {
        self.categories.iter().any(|category| used.contains(category))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFoodRecord {
    pub id: Uuid,
    pub name: String,
    pub using_user_ids: BTreeSet<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CustomFoodRecord {
    pub fn food_ref(&self) -> FoodRef {
        FoodRef {
            id: self.id,
            name: self.name.clone(),
            kind: FoodKind::Custom,
        }
    }
}

/// Lightweight pointer at a catalog entry, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodRef {
    pub id: Uuid,
    pub name: String,
    pub kind: FoodKind,
}

/// Standard food with its derived average rating attached for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedFood {
    #[serde(flatten)]
    pub record: StandardFoodRecord,
    pub average_rating: f64,
}

impl From<StandardFoodRecord> for RatedFood {
    fn from(record: StandardFoodRecord) -> Self {
        let average_rating = record.average_rating();
        Self {
            record,
            average_rating,
        }
    }
}

/// A food tagged on a review, written `kind:uuid` in text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedFood {
    pub food_id: Uuid,
    pub kind: FoodKind,
}

impl FromStr for ReviewedFood {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, id) = value
            .split_once(':')
            .ok_or_else(|| DomainError::validation(format!("expected `kind:id`, got `{value}`")))?;
        let food_id = Uuid::parse_str(id.trim())
            .map_err(|err| DomainError::validation(format!("invalid food id `{id}`: {err}")))?;
        Ok(Self {
            food_id,
            kind: kind.trim().parse()?,
        })
    }
}

/// A meal review as persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub foods: Vec<ReviewedFood>,
    pub speed: FoodSpeed,
    pub meal_time: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub comment: String,
    pub rating: Option<Rating>,
    pub day: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ReviewRecord {
    /// Ids of the tagged standard foods, the only ones that carry statistics.
    pub fn standard_food_ids(&self) -> Vec<Uuid> {
        self.foods
            .iter()
            .filter(|food| food.kind == FoodKind::Standard)
            .map(|food| food.food_id)
            .collect()
    }
}
