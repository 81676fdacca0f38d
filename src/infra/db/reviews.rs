use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{NewReview, ReviewContent, ReviewStore, StoreError},
    domain::{
        entities::{ReviewRecord, ReviewedFood},
        error::DomainError,
        types::{FoodKind, Rating},
    },
};

use super::{PostgresRepositories, map_sqlx_error};

const REVIEW_COLUMNS: &str = "id, user_id, name, food_ids, food_kinds, speed, meal_time, tags, \
    image_url, comment, rating, day, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    food_ids: Vec<Uuid>,
    food_kinds: Vec<String>,
    speed: String,
    meal_time: String,
    tags: Vec<String>,
    image_url: String,
    comment: String,
    rating: Option<i32>,
    day: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ReviewRow> for ReviewRecord {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let integrity = move |err: DomainError| StoreError::Integrity {
            message: format!("review {id}: {err}"),
        };

        if row.food_ids.len() != row.food_kinds.len() {
            return Err(integrity(DomainError::validation(
                "food ids and kinds differ in length",
            )));
        }
        let foods = row
            .food_ids
            .into_iter()
            .zip(row.food_kinds)
            .map(|(food_id, kind)| {
                Ok(ReviewedFood {
                    food_id,
                    kind: kind.parse::<FoodKind>()?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()
            .map_err(integrity)?;

        Ok(Self {
            id,
            user_id: row.user_id,
            name: row.name,
            foods,
            speed: row.speed.parse().map_err(integrity)?,
            meal_time: row.meal_time,
            tags: row.tags,
            image_url: row.image_url,
            comment: row.comment,
            rating: row.rating.map(Rating::try_from).transpose().map_err(integrity)?,
            day: row.day,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn split_foods(foods: &[ReviewedFood]) -> (Vec<Uuid>, Vec<&'static str>) {
    foods
        .iter()
        .map(|food| (food.food_id, food.kind.as_str()))
        .unzip()
}

#[async_trait]
impl ReviewStore for PostgresRepositories {
    async fn insert_review(&self, params: NewReview) -> Result<ReviewRecord, StoreError> {
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
        let (food_ids, food_kinds) = split_foods(&foods);

        let sql = format!(
            "INSERT INTO reviews (id, user_id, name, food_ids, food_kinds, speed, meal_time, \
             tags, image_url, comment, rating, day) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.user_id)
            .bind(&name)
            .bind(&food_ids)
            .bind(&food_kinds)
            .bind(speed.as_str())
            .bind(&meal_time)
            .bind(&tags)
            .bind(&image_url)
            .bind(&comment)
            .bind(rating.map(Rating::get))
            .bind(params.day)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        ReviewRecord::try_from(row)
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<ReviewRecord>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ReviewRecord::try_from).transpose()
    }

    async fn update_review(
        &self,
        id: Uuid,
        content: ReviewContent,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let (food_ids, food_kinds) = split_foods(&content.foods);

        let sql = format!(
            "UPDATE reviews SET name = $2, food_ids = $3, food_kinds = $4, speed = $5, \
             meal_time = $6, tags = $7, image_url = $8, comment = $9, rating = $10, \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .bind(&content.name)
            .bind(&food_ids)
            .bind(&food_kinds)
            .bind(content.speed.as_str())
            .bind(&content.meal_time)
            .bind(&content.tags)
            .bind(&content.image_url)
            .bind(&content.comment)
            .bind(content.rating.map(Rating::get))
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ReviewRecord::try_from).transpose()
    }

    async fn list_reviews_by_day(
        &self,
        user: Uuid,
        day: i32,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE user_id = $1 AND day = $2 \
             ORDER BY created_at, id"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(user)
            .bind(day)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(ReviewRecord::try_from).collect()
    }
}
