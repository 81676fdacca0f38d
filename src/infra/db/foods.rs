use std::collections::BTreeSet;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CatalogStore, NewCustomFood, NewStandardFood, RatingDelta, StoreError},
    domain::{
        entities::{CustomFoodRecord, StandardFoodRecord},
        error::DomainError,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

const STANDARD_COLUMNS: &str = "id, name, image_url, speed, food_type, categories, \
    like_count, review_count, total_rating, created_at";

const CUSTOM_SELECT: &str = "SELECT c.id, c.name, c.created_at, \
    COALESCE(array_agg(u.user_id) FILTER (WHERE u.user_id IS NOT NULL), '{}'::uuid[]) AS using_user_ids \
    FROM custom_foods c \
    LEFT JOIN custom_food_users u ON u.food_id = c.id";

const CUSTOM_GROUP_BY: &str = "GROUP BY c.id, c.name, c.created_at";

#[derive(sqlx::FromRow)]
struct StandardFoodRow {
    id: Uuid,
    name: String,
    image_url: String,
    speed: String,
    food_type: String,
    categories: Vec<String>,
    like_count: i64,
    review_count: i64,
    total_rating: i64,
    created_at: OffsetDateTime,
}

impl TryFrom<StandardFoodRow> for StandardFoodRecord {
    type Error = StoreError;

    fn try_from(row: StandardFoodRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let integrity = move |err: DomainError| StoreError::Integrity {
            message: format!("standard food {id}: {err}"),
        };
        Ok(Self {
            id,
            speed: row.speed.parse().map_err(integrity)?,
            food_type: row.food_type.parse().map_err(integrity)?,
            name: row.name,
            image_url: row.image_url,
            categories: row.categories,
            like_count: row.like_count,
            review_count: row.review_count,
            total_rating: row.total_rating,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CustomFoodRow {
    id: Uuid,
    name: String,
    created_at: OffsetDateTime,
    using_user_ids: Vec<Uuid>,
}

impl From<CustomFoodRow> for CustomFoodRecord {
    fn from(row: CustomFoodRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            using_user_ids: row.using_user_ids.into_iter().collect::<BTreeSet<_>>(),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CatalogStore for PostgresRepositories {
    async fn find_standard_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<StandardFoodRecord>, StoreError> {
        let sql = format!("SELECT {STANDARD_COLUMNS} FROM standard_foods WHERE id = $1");
        let row = sqlx::query_as::<_, StandardFoodRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(StandardFoodRecord::try_from).transpose()
    }

    async fn find_standard_by_name(
        &self,
        name: &str,
    ) -> Result<Option<StandardFoodRecord>, StoreError> {
        let sql = format!("SELECT {STANDARD_COLUMNS} FROM standard_foods WHERE name = $1");
        let row = sqlx::query_as::<_, StandardFoodRow>(&sql)
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(StandardFoodRecord::try_from).transpose()
    }

    async fn find_custom_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CustomFoodRecord>, StoreError> {
        let sql = format!("{CUSTOM_SELECT} WHERE c.name = $1 {CUSTOM_GROUP_BY}");
        let row = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CustomFoodRecord::from))
    }

    async fn list_all_standard(&self) -> Result<Vec<StandardFoodRecord>, StoreError> {
        let sql = format!("SELECT {STANDARD_COLUMNS} FROM standard_foods ORDER BY created_at, id");
        let rows = sqlx::query_as::<_, StandardFoodRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(StandardFoodRecord::try_from).collect()
    }

    async fn list_all_custom(&self) -> Result<Vec<CustomFoodRecord>, StoreError> {
        let sql = format!("{CUSTOM_SELECT} {CUSTOM_GROUP_BY} ORDER BY c.created_at, c.id");
        let rows = sqlx::query_as::<_, CustomFoodRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CustomFoodRecord::from).collect())
    }

    async fn insert_standard(
        &self,
        params: NewStandardFood,
    ) -> Result<StandardFoodRecord, StoreError> {
        let sql = format!(
            "INSERT INTO standard_foods (id, name, image_url, speed, food_type, categories) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {STANDARD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StandardFoodRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&params.name)
            .bind(&params.image_url)
            .bind(params.speed.as_str())
            .bind(params.food_type.as_str())
            .bind(&params.categories)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        StandardFoodRecord::try_from(row)
    }

    async fn insert_custom(&self, params: NewCustomFood) -> Result<CustomFoodRecord, StoreError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let (id, created_at): (Uuid, OffsetDateTime) = sqlx::query_as(
            "INSERT INTO custom_foods (id, name) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query("INSERT INTO custom_food_users (food_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(params.first_user)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(CustomFoodRecord {
            id,
            name: params.name,
            using_user_ids: BTreeSet::from([params.first_user]),
            created_at,
        })
    }

    async fn add_user_to_custom(&self, food_id: Uuid, user: Uuid) -> Result<bool, StoreError> {
        let known: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM custom_foods WHERE id = $1)")
                .bind(food_id)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        if !known {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO custom_food_users (food_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (food_id, user_id) DO NOTHING",
        )
        .bind(food_id)
        .bind(user)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(true)
    }

    async fn increment_like(&self, food_id: Uuid, delta: i64) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE standard_foods SET like_count = GREATEST(like_count + $2, 0) WHERE id = $1",
        )
        .bind(food_id)
        .bind(delta)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn apply_rating_delta(
        &self,
        food_ids: &[Uuid],
        delta: RatingDelta,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE standard_foods \
             SET review_count = review_count + $2, total_rating = total_rating + $3 \
             WHERE id = ANY($1)",
        )
        .bind(food_ids)
        .bind(delta.review_count)
        .bind(delta.rating_sum)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
