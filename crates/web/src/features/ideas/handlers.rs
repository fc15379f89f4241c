use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;
use validator::Validate;
use voting_storage::dto::{
    aggregate::IdeaAggregate, scores::SubmitScoresRequest, voting_state::VotingState,
};
use voting_storage::models::Idea;

use crate::{AppState, error::WebError, middleware::voter::Voter};

#[utoipa::path(
    get,
    path = "/api/ideas/{idea_id}/score",
    params(
        ("idea_id" = Uuid, Path, description = "Idea ID")
    ),
    responses(
        (status = 200, description = "Per-criterion means and weighted total", body = IdeaAggregate),
        (status = 404, description = "Idea not found")
    ),
    tag = "ideas"
)]
pub async fn get_idea_score(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let aggregate = state.voting.idea_aggregate(idea_id).await?;

    Ok(Json(aggregate).into_response())
}

#[utoipa::path(
    get,
    path = "/api/ideas/{idea_id}/voting-state",
    params(
        ("idea_id" = Uuid, Path, description = "Idea ID")
    ),
    responses(
        (status = 200, description = "Rubric and the caller's scores for this idea", body = VotingState),
        (status = 401, description = "Missing or malformed x-user-id header"),
        (status = 404, description = "Idea not found")
    ),
    security(
        ("user_id" = [])
    ),
    tag = "ideas"
)]
pub async fn get_voting_state(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Voter(user_id): Voter,
) -> Result<Response, WebError> {
    let voting_state = state.voting.voting_state(idea_id, user_id).await?;

    Ok(Json(voting_state).into_response())
}

#[utoipa::path(
    put,
    path = "/api/ideas/{idea_id}/votes/me",
    params(
        ("idea_id" = Uuid, Path, description = "Idea ID")
    ),
    request_body = SubmitScoresRequest,
    responses(
        (status = 200, description = "Vote replaced; returns the idea with its committed totals", body = Idea),
        (status = 400, description = "Empty submission or score out of range"),
        (status = 401, description = "Missing or malformed x-user-id header"),
        (status = 404, description = "Idea or criterion not found"),
        (status = 503, description = "Store unavailable, retry the submission")
    ),
    security(
        ("user_id" = [])
    ),
    tag = "ideas"
)]
pub async fn submit_vote(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Voter(user_id): Voter,
    Json(payload): Json<SubmitScoresRequest>,
) -> Result<Response, WebError> {
    payload.validate()?;

    let idea = state
        .voting
        .submit_scores(idea_id, user_id, &payload)
        .await?;

    Ok(Json(idea).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/ideas/{idea_id}/votes/me",
    params(
        ("idea_id" = Uuid, Path, description = "Idea ID")
    ),
    responses(
        (status = 204, description = "Vote removed, or there was none for this idea"),
        (status = 401, description = "Missing or malformed x-user-id header")
    ),
    security(
        ("user_id" = [])
    ),
    tag = "ideas"
)]
pub async fn remove_vote(
    State(state): State<AppState>,
    Path(idea_id): Path<Uuid>,
    Voter(user_id): Voter,
) -> Result<Response, WebError> {
    state.voting.remove_vote(idea_id, user_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
