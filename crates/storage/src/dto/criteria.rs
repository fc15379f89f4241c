use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Criterion;

/// Weights of a configured rubric must add up to this value.
pub const TOTAL_WEIGHT: i64 = 100;

/// Request payload for adding a criterion to a hackathon's rubric
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCriterionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Weight must be between 1 and 100"))]
    pub weight: i32,

    /// Appended after the last criterion when omitted.
    #[validate(range(min = 0))]
    pub display_order: Option<i32>,
}

/// Partial update of a criterion; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCriterionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,

    /// A blank value clears the stored description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Weight must be between 1 and 100"))]
    pub weight: Option<i32>,

    #[validate(range(min = 0))]
    pub display_order: Option<i32>,

    /// When set, the update is rejected unless the stored version matches.
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReorderCriteriaRequest {
    #[validate(length(min = 1, message = "At least one criterion id is required"))]
    pub criteria_ids: Vec<Uuid>,
}

/// Rubric listing together with both configuration signals.
///
/// `has_criteria == false` means voting is not configured yet;
/// `has_criteria && !is_valid` means the weights are misconfigured.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CriteriaOverview {
    pub criteria: Vec<Criterion>,
    pub total_weight: i64,
    pub has_criteria: bool,
    pub is_valid: bool,
}

impl CriteriaOverview {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        let total_weight = total_weight(&criteria);
        let has_criteria = !criteria.is_empty();

        Self {
            criteria,
            total_weight,
            has_criteria,
            is_valid: total_weight == TOTAL_WEIGHT,
        }
    }
}

pub fn total_weight(criteria: &[Criterion]) -> i64 {
    criteria.iter().map(|c| i64::from(c.weight)).sum()
}

fn validate_name(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim().is_empty() {
        return Err(validator::ValidationError::new("blank_name")
            .with_message("Name must not be blank".into()));
    }
    Ok(())
}
