use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use voting_storage::VotingService;

pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod routes;

use features::{admin, criteria, ideas, leaderboard};
use middleware::auth::ApiKeys;
use middleware::voter::USER_ID_HEADER;

#[derive(OpenApi)]
#[openapi(
    paths(
        criteria::handlers::list_criteria,
        criteria::handlers::create_criterion,
        criteria::handlers::update_criterion,
        criteria::handlers::delete_criterion,
        criteria::handlers::reorder_criteria,
        ideas::handlers::get_idea_score,
        ideas::handlers::get_voting_state,
        ideas::handlers::submit_vote,
        ideas::handlers::remove_vote,
        leaderboard::handlers::get_leaderboard,
        admin::handlers::recompute_all_scores,
    ),
    components(
        schemas(
            voting_storage::dto::criteria::CreateCriterionRequest,
            voting_storage::dto::criteria::UpdateCriterionRequest,
            voting_storage::dto::criteria::ReorderCriteriaRequest,
            voting_storage::dto::criteria::CriteriaOverview,
            voting_storage::dto::scores::SubmitScoresRequest,
            voting_storage::dto::voting_state::VotingState,
            voting_storage::dto::aggregate::IdeaAggregate,
            voting_storage::dto::aggregate::CriterionStat,
            voting_storage::dto::leaderboard::LeaderboardEntry,
            voting_storage::dto::common::PaginationMeta,
            voting_storage::models::Criterion,
            voting_storage::models::Idea,
            admin::handlers::RecomputeResponse,
        )
    ),
    tags(
        (name = "criteria", description = "Per-hackathon scoring rubric"),
        (name = "ideas", description = "Idea scores and the caller's vote"),
        (name = "leaderboard", description = "Ideas ranked by weighted total"),
        (name = "admin", description = "Maintenance endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "user_id",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(USER_ID_HEADER),
                    ),
                ),
            );
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub voting: Arc<VotingService>,
}

impl AppState {
    pub fn new(voting: VotingService) -> Self {
        Self {
            voting: Arc::new(voting),
        }
    }
}

/// Full application: API routes, Swagger UI, CORS and request tracing.
pub fn app(state: AppState, api_keys: ApiKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .merge(routes::api_routes(api_keys))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
