use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{LikesStore, StoreError};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl LikesStore for PostgresRepositories {
    async fn add_liked_food(&self, user: Uuid, food_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO user_liked_foods (user_id, food_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, food_id) DO NOTHING",
        )
        .bind(user)
        .bind(food_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_liked_food(&self, user: Uuid, food_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_liked_foods WHERE user_id = $1 AND food_id = $2")
            .bind(user)
            .bind(food_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_liked_foods(&self, user: Uuid) -> Result<Vec<Uuid>, StoreError> {
        sqlx::query_scalar(
            "SELECT food_id FROM user_liked_foods WHERE user_id = $1 ORDER BY liked_at, food_id",
        )
        .bind(user)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
