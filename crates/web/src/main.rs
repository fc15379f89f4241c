use std::sync::Arc;

use anyhow::Context;
use voting_storage::{
    Database, VotingService,
    services::{
        change_feed::{ChangeFeed, ChangeFilter},
        score_cache::ScoreCache,
    },
};
use voting_web::{AppState, config::Config, middleware::auth::ApiKeys};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting idea voting API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::with_max_connections(&config.database_url, config.max_connections)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let feed = ChangeFeed::default();

    if config.listen_for_changes {
        let listener_db = db.clone();
        let listener_feed = feed.clone();
        tokio::spawn(async move {
            if let Err(e) = listener_db.forward_changes(listener_feed).await {
                tracing::error!("Change listener stopped: {}", e);
            }
        });
        tracing::info!("Listening for voting changes from the database");
    }

    let mut voting = VotingService::new(Arc::new(db), feed.clone());

    if config.score_cache_enabled {
        let cache = Arc::new(ScoreCache::new());
        cache.clone().spawn_listener(feed.subscribe(ChangeFilter::all()));
        voting = voting.with_cache(cache);
        tracing::info!("Score cache enabled");
    }

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("No API_KEYS configured, rubric management endpoints will reject every request");
    }

    let app = voting_web::app(AppState::new(voting), api_keys);

    let bind_address = config.bind_address();
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
