use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use uuid::Uuid;
use voting_storage::dto::{
    common::{PaginatedResponse, PaginationParams},
    leaderboard::LeaderboardEntry,
};

use crate::{AppState, error::WebError};

#[utoipa::path(
    get,
    path = "/api/hackathons/{hackathon_id}/leaderboard",
    params(
        ("hackathon_id" = Uuid, Path, description = "Hackathon ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Ideas ranked by weighted total", body = PaginatedResponse<LeaderboardEntry>),
        (status = 400, description = "Invalid pagination parameters")
    ),
    tag = "leaderboard"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(hackathon_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, WebError> {
    pagination.validate().map_err(WebError::BadRequest)?;

    let (entries, total_items) = state.voting.leaderboard(hackathon_id, &pagination).await?;

    let response = PaginatedResponse::new(
        entries,
        pagination.page,
        pagination.page_size,
        total_items,
    );

    Ok(Json(response).into_response())
}
