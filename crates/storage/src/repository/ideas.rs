use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::Idea;

const IDEA_COLUMNS: &str = "idea_id, hackathon_id, title, total_score, vote_count";

/// Recomputes the cached aggregate columns from the current score and
/// criterion rows; matches `services::aggregation::aggregate`.
const TOTALS_ASSIGNMENT: &str = r#"
    total_score = COALESCE((
        SELECT SUM(
            c.weight * COALESCE((
                SELECT AVG(s.score)::DOUBLE PRECISION
                FROM idea_scores s
                WHERE s.idea_id = ideas.idea_id AND s.criteria_id = c.id
            ), 0) / 100.0
        )
        FROM voting_criteria c
        WHERE c.hackathon_id = ideas.hackathon_id
    ), 0),
    vote_count = (
        SELECT COUNT(DISTINCT s.user_id)
        FROM idea_scores s
        WHERE s.idea_id = ideas.idea_id
    )
"#;

pub struct IdeaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> IdeaRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        let idea = sqlx::query_as::<_, Idea>(&format!(
            "SELECT {IDEA_COLUMNS} FROM ideas WHERE idea_id = $1"
        ))
        .bind(idea_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(idea)
    }

    /// List ideas, optionally restricted to one hackathon
    pub async fn list(&self, hackathon_id: Option<Uuid>) -> Result<Vec<Idea>> {
        let ideas = sqlx::query_as::<_, Idea>(&format!(
            r#"
            SELECT {IDEA_COLUMNS}
            FROM ideas
            WHERE $1::uuid IS NULL OR hackathon_id = $1
            ORDER BY created_at, idea_id
            "#
        ))
        .bind(hackathon_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ideas)
    }

    /// Recompute one idea's cached totals in their own transaction
    pub async fn refresh_totals(&self, idea_id: Uuid) -> Result<Option<Idea>> {
        let mut tx = self.pool.begin().await?;

        if !lock_idea(&mut tx, idea_id).await? {
            return Ok(None);
        }
        let idea = write_idea_totals(&mut tx, idea_id).await?;

        tx.commit().await?;

        Ok(Some(idea))
    }
}

/// Take the row lock every writer of an idea's scores or totals goes through.
///
/// Statements issued after this returns see every commit made by the
/// previous holder, so totals written under the lock are never stale.
pub(crate) async fn lock_idea(conn: &mut PgConnection, idea_id: Uuid) -> Result<bool> {
    let locked = sqlx::query_scalar::<_, Uuid>(
        "SELECT idea_id FROM ideas WHERE idea_id = $1 FOR UPDATE",
    )
    .bind(idea_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(locked.is_some())
}

/// Lock every idea of a hackathon, in id order, before its rubric changes.
pub(crate) async fn lock_hackathon_ideas(conn: &mut PgConnection, hackathon_id: Uuid) -> Result<()> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT idea_id FROM ideas WHERE hackathon_id = $1 ORDER BY idea_id FOR UPDATE",
    )
    .bind(hackathon_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn write_idea_totals(conn: &mut PgConnection, idea_id: Uuid) -> Result<Idea> {
    let idea = sqlx::query_as::<_, Idea>(&format!(
        "UPDATE ideas SET {TOTALS_ASSIGNMENT} WHERE idea_id = $1 RETURNING {IDEA_COLUMNS}"
    ))
    .bind(idea_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(idea)
}

pub(crate) async fn write_hackathon_totals(conn: &mut PgConnection, hackathon_id: Uuid) -> Result<u64> {
    let result = sqlx::query(&format!(
        "UPDATE ideas SET {TOTALS_ASSIGNMENT} WHERE hackathon_id = $1"
    ))
    .bind(hackathon_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
