use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::criteria::{CreateCriterionRequest, UpdateCriterionRequest};
use crate::error::{Result, StorageError};
use crate::models::Criterion;
use crate::repository::ideas;

const CRITERION_COLUMNS: &str =
    "id, hackathon_id, name, description, weight, display_order, version, created_at";

pub struct CriteriaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CriteriaRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a hackathon's criteria by display order
    pub async fn list(&self, hackathon_id: Uuid) -> Result<Vec<Criterion>> {
        let criteria = sqlx::query_as::<_, Criterion>(&format!(
            r#"
            SELECT {CRITERION_COLUMNS}
            FROM voting_criteria
            WHERE hackathon_id = $1
            ORDER BY display_order, created_at, id
            "#
        ))
        .bind(hackathon_id)
        .fetch_all(self.pool)
        .await?;

        Ok(criteria)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Criterion>> {
        let criterion = sqlx::query_as::<_, Criterion>(&format!(
            "SELECT {CRITERION_COLUMNS} FROM voting_criteria WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(criterion)
    }

    /// Insert a criterion, appending it after the last one when no order is
    /// given, and rewrite the totals of the hackathon's ideas
    pub async fn create(
        &self,
        hackathon_id: Uuid,
        req: &CreateCriterionRequest,
    ) -> Result<Criterion> {
        let mut tx = self.pool.begin().await?;
        ideas::lock_hackathon_ideas(&mut tx, hackathon_id).await?;

        let criterion = sqlx::query_as::<_, Criterion>(&format!(
            r#"
            INSERT INTO voting_criteria (hackathon_id, name, description, weight, display_order)
            VALUES (
                $1, $2, $3, $4,
                COALESCE(
                    $5,
                    (SELECT COALESCE(MAX(display_order) + 1, 0)
                     FROM voting_criteria WHERE hackathon_id = $1)
                )
            )
            RETURNING {CRITERION_COLUMNS}
            "#
        ))
        .bind(hackathon_id)
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(req.weight)
        .bind(req.display_order)
        .fetch_one(&mut *tx)
        .await?;

        ideas::write_hackathon_totals(&mut tx, hackathon_id).await?;
        tx.commit().await?;

        Ok(criterion)
    }

    /// Apply a partial update, guarded by `expected_version` when present.
    ///
    /// A blank `description` clears it.
    pub async fn update(&self, id: Uuid, req: &UpdateCriterionRequest) -> Result<Criterion> {
        let mut tx = self.pool.begin().await?;

        let Some(hackathon_id) = hackathon_of(&mut tx, id).await? else {
            return Err(StorageError::NotFound);
        };
        ideas::lock_hackathon_ideas(&mut tx, hackathon_id).await?;

        let updated = sqlx::query_as::<_, Criterion>(&format!(
            r#"
            UPDATE voting_criteria
            SET name = COALESCE($2, name),
                description = CASE
                    WHEN $3::text IS NULL THEN description
                    WHEN btrim($3) = '' THEN NULL
                    ELSE $3
                END,
                weight = COALESCE($4, weight),
                display_order = COALESCE($5, display_order),
                version = version + 1
            WHERE id = $1
              AND ($6::integer IS NULL OR version = $6)
            RETURNING {CRITERION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.description)
        .bind(req.weight)
        .bind(req.display_order)
        .bind(req.expected_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(criterion) = updated else {
            let current = sqlx::query_scalar::<_, i32>(
                "SELECT version FROM voting_criteria WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

            return match current {
                Some(version) => Err(StorageError::Conflict(format!(
                    "criterion {} is at version {}, expected {}",
                    id,
                    version,
                    req.expected_version.unwrap_or_default()
                ))),
                None => Err(StorageError::NotFound),
            };
        };

        ideas::write_hackathon_totals(&mut tx, hackathon_id).await?;
        tx.commit().await?;

        Ok(criterion)
    }

    /// Delete a criterion, returning the removed row if there was one.
    ///
    /// Its scores cascade away and the hackathon's idea totals are rewritten.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Criterion>> {
        let mut tx = self.pool.begin().await?;

        let Some(hackathon_id) = hackathon_of(&mut tx, id).await? else {
            return Ok(None);
        };
        ideas::lock_hackathon_ideas(&mut tx, hackathon_id).await?;

        let deleted = sqlx::query_as::<_, Criterion>(&format!(
            "DELETE FROM voting_criteria WHERE id = $1 RETURNING {CRITERION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if deleted.is_some() {
            ideas::write_hackathon_totals(&mut tx, hackathon_id).await?;
        }
        tx.commit().await?;

        Ok(deleted)
    }

    /// Rewrite display order from the position of each id, all or nothing
    pub async fn reorder(&self, hackathon_id: Uuid, ordered_ids: &[Uuid]) -> Result<Vec<Criterion>> {
        let mut tx = self.pool.begin().await?;

        for (position, id) in ordered_ids.iter().enumerate() {
            let result = sqlx::query(
                r#"
                UPDATE voting_criteria
                SET display_order = $3, version = version + 1
                WHERE id = $1 AND hackathon_id = $2
                "#,
            )
            .bind(id)
            .bind(hackathon_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StorageError::NotFound);
            }
        }

        tx.commit().await?;

        self.list(hackathon_id).await
    }
}

async fn hackathon_of(conn: &mut PgConnection, id: Uuid) -> Result<Option<Uuid>> {
    let hackathon_id =
        sqlx::query_scalar::<_, Uuid>("SELECT hackathon_id FROM voting_criteria WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(hackathon_id)
}
