use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One rater's 1..=10 judgment of one idea against one criterion.
///
/// Unique per `(idea_id, user_id, criteria_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IdeaScore {
    pub idea_id: Uuid,
    pub user_id: Uuid,
    pub criteria_id: Uuid,
    pub score: i32,
    pub created_at: NaiveDateTime,
}
