use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A weighted axis of evaluation for ideas within one hackathon.
///
/// `weight` is a percentage in 1..=100. Across one hackathon the weights are
/// expected to sum to exactly 100 before voting is considered configured, but
/// single writes are not rejected for breaking that sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Criterion {
    pub id: Uuid,
    pub hackathon_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub weight: i32,
    pub display_order: i32,
    /// Incremented on every update, used by optional optimistic concurrency.
    pub version: i32,
    pub created_at: NaiveDateTime,
}
