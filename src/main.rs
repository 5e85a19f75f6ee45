//! Crossroads server binary.
//!
//! Wires the Gemini provider, PostgreSQL storage, and the pipeline
//! handlers into an Axum application.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crossroads::adapters::ai::{GeminiConfig, GeminiProvider};
use crossroads::adapters::http::{dilemma_router, DilemmaAppState};
use crossroads::adapters::storage::PostgresRunRepository;
use crossroads::application::handlers::{GetHistoryHandler, SubmitDilemmaHandler};
use crossroads::application::{PipelineOrchestrator, StageModels};
use crossroads::config::AppConfig;
use crossroads::ports::{ModelClient, RetryPolicy, RunRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
    }

    let gemini_config = GeminiConfig::new(
        config.ai.gemini_api_key.clone().unwrap_or_default(),
    )
    .with_base_url(config.ai.base_url.clone())
    .with_reasoning_model(config.ai.reasoning_model.clone())
    .with_fast_model(config.ai.fast_model.clone())
    .with_timeout(config.ai.timeout());

    let client: Arc<dyn ModelClient> = Arc::new(GeminiProvider::new(gemini_config)?);
    let provider_info = client.provider_info();

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        Arc::clone(&client),
        StageModels {
            reasoning: config.ai.reasoning_model.clone(),
            fast: config.ai.fast_model.clone(),
        },
        RetryPolicy {
            max_retries: config.ai.max_retries,
            initial_backoff: Duration::from_secs(1),
        },
    ));

    let repository: Arc<dyn RunRepository> = Arc::new(PostgresRunRepository::new(pool));

    let state = DilemmaAppState::new(
        Arc::new(SubmitDilemmaHandler::new(
            orchestrator,
            Arc::clone(&repository),
            config.ai.pipeline_timeout(),
        )),
        Arc::new(GetHistoryHandler::new(repository)),
        provider_info,
    );

    let cors = if config.server.cors_origins_list().is_empty() {
        CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any)
    } else {
        let origins = config
            .server
            .cors_origins_list()
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_headers(Any)
            .allow_methods(Any)
    };

    let app = dilemma_router().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            // Outer HTTP timeout sits above the pipeline deadline so the
            // handler's own timeout reporting wins in the normal case.
            .layer(TimeoutLayer::new(
                config.ai.pipeline_timeout() + Duration::from_secs(5),
            )),
    );

    let addr = config.server.socket_addr()?;
    info!(%addr, provider = "gemini", "starting crossroads server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
