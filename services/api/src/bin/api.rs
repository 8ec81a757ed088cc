//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        OpenAiAdvisorAdapter, OpenAiReviewAdapter, OpenAiSupportAdapter, PgKeyValueStore,
        TemplatedMailer,
    },
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use lexvault_core::{KeyValueStore, MemoryStore, Store, WorkspaceServices};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// How often cached workspaces are checked for inactivity.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Persistence Substrate ---
    let kv: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let pg_store = PgKeyValueStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store. Data is lost on restart.");
            Arc::new(MemoryStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let review_adapter = Arc::new(OpenAiReviewAdapter::new(
        openai_client.clone(),
        config.extraction_model.clone(),
        config.advisory_model.clone(),
    ));
    let services = WorkspaceServices {
        store: Store::new(kv),
        extraction: review_adapter.clone(),
        advisory: review_adapter,
        support: Arc::new(OpenAiSupportAdapter::new(
            openai_client.clone(),
            config.support_model.clone(),
        )),
        admin_advisor: Arc::new(OpenAiAdvisorAdapter::new(
            openai_client.clone(),
            config.advisory_model.clone(),
        )),
        mail: Arc::new(TemplatedMailer::new(
            openai_client,
            config.support_model.clone(),
        )),
        policy: Arc::new(config.policy()),
    };
    if config.admin_email.is_none() {
        warn!("ADMIN_EMAIL is not set; administrator login is disabled.");
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), services));

    // Reclaim workspaces whose clients left without logging out.
    tokio::spawn({
        let app_state = app_state.clone();
        async move {
            let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = app_state.sweep_idle().await;
                if removed > 0 {
                    let live = app_state.live_sessions().await;
                    info!(
                        removed,
                        live,
                        "Swept idle sessions"
                    );
                }
            }
        }
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
