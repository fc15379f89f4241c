use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    create_criterion, delete_criterion, list_criteria, reorder_criteria, update_criterion,
};
use crate::AppState;
use crate::middleware::auth::{ApiKeys, require_auth};

/// Routes nested under `/hackathons`
pub fn hackathon_routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/:hackathon_id/criteria", post(create_criterion))
        .route("/:hackathon_id/criteria/order", put(reorder_criteria))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:hackathon_id/criteria", get(list_criteria))
        .merge(protected)
}

/// Routes nested under `/criteria`
pub fn criterion_routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .route("/:criterion_id", put(update_criterion).delete(delete_criterion))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
