use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The slice of an idea row the scoring core reads and writes.
///
/// `total_score` and `vote_count` are a cache of the aggregate computed from
/// `idea_scores`; they are only ever overwritten with a fresh recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Idea {
    pub idea_id: Uuid,
    pub hackathon_id: Uuid,
    pub title: String,
    pub total_score: f64,
    pub vote_count: i64,
}
