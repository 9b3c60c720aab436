//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiTextModel, OwnerPolicy},
    config::Config,
    error::ApiError,
    web::{
        documents::{
            analyze_document_handler, create_document_handler, delete_document_handler,
            draft_document_handler, get_document_handler, list_documents_handler,
            update_document_handler,
        },
        rest::{health_handler, ApiDoc},
        state::AppState,
        versions::{
            compare_versions_handler, get_version_handler, list_versions_handler,
            restore_version_handler, save_content_handler,
        },
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{get, post, put},
    Router,
};
use docket_core::{HistoryEngine, VersionLedger};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let drafting = Arc::new(OpenAiTextModel::new(
        openai_client.clone(),
        config.draft_model.clone(),
    ));
    let analysis = Arc::new(OpenAiTextModel::new(
        openai_client.clone(),
        config.analysis_model.clone(),
    ));
    let access = Arc::new(OwnerPolicy::new(db_adapter.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store: db_adapter.clone(),
        access,
        ledger: VersionLedger::new(db_adapter.clone()),
        history: HistoryEngine::new(db_adapter),
        drafting,
        analysis,
        config: config.clone(),
    });

    // --- 5. Configure CORS ---
    let allowed_origin = config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            ApiError::Internal(format!(
                "Invalid CORS_ALLOWED_ORIGIN '{}': {}",
                config.cors_allowed_origin, e
            ))
        })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static("x-user-id"),
        ]);

    // --- 6. Create the Web Router ---
    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/documents",
            post(create_document_handler).get(list_documents_handler),
        )
        .route(
            "/documents/{id}",
            get(get_document_handler)
                .patch(update_document_handler)
                .delete(delete_document_handler),
        )
        .route("/documents/{id}/content", put(save_content_handler))
        .route("/documents/{id}/versions", get(list_versions_handler))
        .route(
            "/documents/{id}/versions/compare",
            get(compare_versions_handler),
        )
        .route(
            "/documents/{id}/versions/{version_id}",
            get(get_version_handler),
        )
        .route(
            "/documents/{id}/versions/{version_id}/restore",
            post(restore_version_handler),
        )
        .route("/documents/{id}/draft", post(draft_document_handler))
        .route("/documents/{id}/analyze", post(analyze_document_handler))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
