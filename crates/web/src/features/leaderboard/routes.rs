use axum::{Router, routing::get};

use super::handlers::get_leaderboard;
use crate::AppState;

/// Routes nested under `/hackathons`
pub fn routes() -> Router<AppState> {
    Router::new().route("/:hackathon_id/leaderboard", get(get_leaderboard))
}
