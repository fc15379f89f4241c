use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;
use validator::Validate;
use voting_storage::{
    dto::criteria::{
        CreateCriterionRequest, CriteriaOverview, ReorderCriteriaRequest, UpdateCriterionRequest,
    },
    models::Criterion,
};

use crate::{AppState, error::WebError};

#[utoipa::path(
    get,
    path = "/api/hackathons/{hackathon_id}/criteria",
    params(
        ("hackathon_id" = Uuid, Path, description = "Hackathon ID")
    ),
    responses(
        (status = 200, description = "Rubric with its total weight and validity", body = CriteriaOverview),
        (status = 503, description = "Store unavailable")
    ),
    tag = "criteria"
)]
pub async fn list_criteria(
    State(state): State<AppState>,
    Path(hackathon_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let overview = state.voting.criteria_overview(hackathon_id).await?;

    Ok(Json(overview).into_response())
}

#[utoipa::path(
    post,
    path = "/api/hackathons/{hackathon_id}/criteria",
    params(
        ("hackathon_id" = Uuid, Path, description = "Hackathon ID")
    ),
    request_body = CreateCriterionRequest,
    responses(
        (status = 201, description = "Criterion created", body = Criterion),
        (status = 400, description = "Invalid name or weight"),
        (status = 401, description = "Unauthorized - invalid or missing API key")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "criteria"
)]
pub async fn create_criterion(
    State(state): State<AppState>,
    Path(hackathon_id): Path<Uuid>,
    Json(payload): Json<CreateCriterionRequest>,
) -> Result<Response, WebError> {
    payload.validate()?;

    let criterion = state.voting.create_criterion(hackathon_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(criterion)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/criteria/{criterion_id}",
    params(
        ("criterion_id" = Uuid, Path, description = "Criterion ID")
    ),
    request_body = UpdateCriterionRequest,
    responses(
        (status = 200, description = "Criterion updated", body = Criterion),
        (status = 400, description = "Invalid name or weight"),
        (status = 401, description = "Unauthorized - invalid or missing API key"),
        (status = 404, description = "Criterion not found"),
        (status = 409, description = "Criterion was modified concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "criteria"
)]
pub async fn update_criterion(
    State(state): State<AppState>,
    Path(criterion_id): Path<Uuid>,
    Json(payload): Json<UpdateCriterionRequest>,
) -> Result<Response, WebError> {
    payload.validate()?;

    let criterion = state.voting.update_criterion(criterion_id, &payload).await?;

    Ok(Json(criterion).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/criteria/{criterion_id}",
    params(
        ("criterion_id" = Uuid, Path, description = "Criterion ID")
    ),
    responses(
        (status = 204, description = "Criterion deleted, or already absent"),
        (status = 401, description = "Unauthorized - invalid or missing API key")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "criteria"
)]
pub async fn delete_criterion(
    State(state): State<AppState>,
    Path(criterion_id): Path<Uuid>,
) -> Result<Response, WebError> {
    state.voting.delete_criterion(criterion_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    put,
    path = "/api/hackathons/{hackathon_id}/criteria/order",
    params(
        ("hackathon_id" = Uuid, Path, description = "Hackathon ID")
    ),
    request_body = ReorderCriteriaRequest,
    responses(
        (status = 200, description = "Criteria in their new display order", body = Vec<Criterion>),
        (status = 400, description = "Duplicate or empty id list"),
        (status = 401, description = "Unauthorized - invalid or missing API key"),
        (status = 404, description = "A criterion does not belong to this hackathon")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "criteria"
)]
pub async fn reorder_criteria(
    State(state): State<AppState>,
    Path(hackathon_id): Path<Uuid>,
    Json(payload): Json<ReorderCriteriaRequest>,
) -> Result<Response, WebError> {
    payload.validate()?;

    let criteria = state.voting.reorder_criteria(hackathon_id, &payload).await?;

    Ok(Json(criteria).into_response())
}
