use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Score picture of one idea, derived purely from current criteria and scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IdeaAggregate {
    pub idea_id: Uuid,
    pub hackathon_id: Uuid,
    pub criteria_stats: Vec<CriterionStat>,
    pub weighted_total: f64,
    pub distinct_voters: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CriterionStat {
    pub criteria_id: Uuid,
    pub name: String,
    pub weight: i32,
    /// 0 when nobody scored the criterion.
    pub mean_score: f64,
    pub respondent_count: i64,
}
