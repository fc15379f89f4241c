use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{AppState, error::WebError};

#[derive(Debug, Serialize, ToSchema)]
pub struct RecomputeResponse {
    pub ideas_recomputed: u64,
}

#[utoipa::path(
    post,
    path = "/api/admin/scores/recompute-all",
    responses(
        (status = 200, description = "Cached totals rebuilt for every idea", body = RecomputeResponse),
        (status = 401, description = "Unauthorized - invalid or missing API key")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "admin"
)]
pub async fn recompute_all_scores(State(state): State<AppState>) -> Result<Response, WebError> {
    let ideas_recomputed = state.voting.recompute_all().await?;

    Ok(Json(RecomputeResponse { ideas_recomputed }).into_response())
}
