use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Criterion;

/// Everything the scoring form needs for one user and one idea.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VotingState {
    pub criteria: Vec<Criterion>,
    pub user_scores: BTreeMap<Uuid, i32>,
    /// At least one score exists, even if not every criterion was scored.
    pub has_voted: bool,
    /// Every current criterion has a score from this user.
    pub is_complete: bool,
}

impl VotingState {
    pub fn new(criteria: Vec<Criterion>, user_scores: BTreeMap<Uuid, i32>) -> Self {
        let has_voted = !user_scores.is_empty();
        let is_complete = is_complete(&criteria, &user_scores);

        Self {
            criteria,
            user_scores,
            has_voted,
            is_complete,
        }
    }
}

pub fn is_complete(criteria: &[Criterion], user_scores: &BTreeMap<Uuid, i32>) -> bool {
    criteria.iter().all(|c| user_scores.contains_key(&c.id))
}
