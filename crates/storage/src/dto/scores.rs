use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 10;

/// A user's full score set for one idea, keyed by criterion id.
///
/// Submitting replaces every score the user previously gave the idea.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitScoresRequest {
    #[validate(length(min = 1, message = "At least one score is required"))]
    #[validate(custom(function = "validate_score_values"))]
    pub scores: BTreeMap<Uuid, i32>,
}

fn validate_score_values(scores: &BTreeMap<Uuid, i32>) -> Result<(), validator::ValidationError> {
    if scores
        .values()
        .all(|score| (MIN_SCORE..=MAX_SCORE).contains(score))
    {
        Ok(())
    } else {
        Err(validator::ValidationError::new("score_range")
            .with_message("All scores must be between 1 and 10".into()))
    }
}
