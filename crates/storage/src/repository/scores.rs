use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Idea, IdeaScore};
use crate::repository::ideas;

pub struct ScoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ScoreRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_idea(&self, idea_id: Uuid) -> Result<Vec<IdeaScore>> {
        let scores = sqlx::query_as::<_, IdeaScore>(
            r#"
            SELECT idea_id, user_id, criteria_id, score, created_at
            FROM idea_scores
            WHERE idea_id = $1
            ORDER BY user_id, criteria_id
            "#,
        )
        .bind(idea_id)
        .fetch_all(self.pool)
        .await?;

        Ok(scores)
    }

    pub async fn for_user(&self, idea_id: Uuid, user_id: Uuid) -> Result<Vec<IdeaScore>> {
        let scores = sqlx::query_as::<_, IdeaScore>(
            r#"
            SELECT idea_id, user_id, criteria_id, score, created_at
            FROM idea_scores
            WHERE idea_id = $1 AND user_id = $2
            ORDER BY criteria_id
            "#,
        )
        .bind(idea_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(scores)
    }

    pub async fn count_for_user(&self, idea_id: Uuid, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM idea_scores WHERE idea_id = $1 AND user_id = $2",
        )
        .bind(idea_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Replace a user's whole score set for an idea and rewrite the idea's
    /// cached totals, all in one transaction
    pub async fn replace_for_user(
        &self,
        idea_id: Uuid,
        user_id: Uuid,
        scores: &[(Uuid, i32)],
    ) -> Result<Idea> {
        let mut tx = self.pool.begin().await?;

        if !ideas::lock_idea(&mut tx, idea_id).await? {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM idea_scores WHERE idea_id = $1 AND user_id = $2")
            .bind(idea_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if !scores.is_empty() {
            let mut insert: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO idea_scores (idea_id, user_id, criteria_id, score) ");
            insert.push_values(scores, |mut row, (criteria_id, score)| {
                row.push_bind(idea_id)
                    .push_bind(user_id)
                    .push_bind(*criteria_id)
                    .push_bind(*score);
            });
            insert.build().execute(&mut *tx).await?;
        }

        let idea = ideas::write_idea_totals(&mut tx, idea_id).await?;

        tx.commit().await?;

        Ok(idea)
    }

    /// Remove a user's scores for an idea and rewrite the idea's totals
    pub async fn delete_for_user(&self, idea_id: Uuid, user_id: Uuid) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        if !ideas::lock_idea(&mut tx, idea_id).await? {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM idea_scores WHERE idea_id = $1 AND user_id = $2")
            .bind(idea_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() > 0 {
            ideas::write_idea_totals(&mut tx, idea_id).await?;
        }

        tx.commit().await?;

        Ok(result.rows_affected())
    }
}
