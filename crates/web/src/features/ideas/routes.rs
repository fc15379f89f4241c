use axum::{
    Router,
    routing::{get, put},
};

use super::handlers::{get_idea_score, get_voting_state, remove_vote, submit_vote};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:idea_id/score", get(get_idea_score))
        .route("/:idea_id/voting-state", get(get_voting_state))
        .route("/:idea_id/votes/me", put(submit_vote).delete(remove_vote))
}
