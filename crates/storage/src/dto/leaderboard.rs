use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One ranked idea; ranks start at 1.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub idea_id: Uuid,
    pub title: String,
    pub weighted_total: f64,
    pub distinct_voters: i64,
}
