use axum::Router;

use crate::AppState;
use crate::features::{admin, criteria, ideas, leaderboard};
use crate::middleware::auth::ApiKeys;

/// Every API route, mounted under `/api`
pub fn api_routes(api_keys: ApiKeys) -> Router<AppState> {
    let hackathons = criteria::routes::hackathon_routes(api_keys.clone())
        .merge(leaderboard::routes::routes());

    let api = Router::new()
        .nest("/hackathons", hackathons)
        .nest("/criteria", criteria::routes::criterion_routes(api_keys.clone()))
        .nest("/ideas", ideas::routes::routes())
        .nest("/admin", admin::routes::routes(api_keys));

    Router::new().nest("/api", api)
}
