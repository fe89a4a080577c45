//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        chat_llm::OpenAiChatAdapter, db::DbAdapter, extract::DocumentExtractor,
        object_store::HttpObjectStore, ocr_llm::OpenAiOcrAdapter, redact_llm::OpenAiRedactAdapter,
        risk_llm::OpenAiRiskAdapter, summary_llm::OpenAiSummaryAdapter,
        verify_llm::OpenAiVerifyAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, signup_handler},
        middleware::require_auth,
        rest::ApiDoc,
        state::AppState,
        analyze_document_handler, chat_handler, health_handler, list_documents_handler,
        redact_document_handler, upload_document_handler, verify_document_handler,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use veridoc_core::{redact::Redactor, verify::VerificationPipeline};

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
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {e}")))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(&config.openai_api_key);
    let openai_client = Client::with_config(openai_config);
    let llm_timeout = Duration::from_secs(config.llm_timeout_secs);

    let ocr = Arc::new(OpenAiOcrAdapter::new(
        openai_client.clone(),
        config.ocr_model.clone(),
        llm_timeout,
    ));
    let extractor = Arc::new(DocumentExtractor::new(ocr));
    let verifier = Arc::new(OpenAiVerifyAdapter::new(
        openai_client.clone(),
        config.analysis_model.clone(),
        llm_timeout,
    ));
    let summarizer = Arc::new(OpenAiSummaryAdapter::new(
        openai_client.clone(),
        config.analysis_model.clone(),
        llm_timeout,
    ));
    let risk = Arc::new(OpenAiRiskAdapter::new(
        openai_client.clone(),
        config.analysis_model.clone(),
        llm_timeout,
    ));
    let semantic_redactor = Arc::new(OpenAiRedactAdapter::new(
        openai_client.clone(),
        config.analysis_model.clone(),
        llm_timeout,
    ));
    let chat = Arc::new(OpenAiChatAdapter::new(
        openai_client,
        config.chat_model.clone(),
        llm_timeout,
    ));

    let storage = Arc::new(
        HttpObjectStore::new(
            &config.storage_endpoint,
            &config.storage_bucket,
            &config.storage_token,
        )
        .map_err(|e| ApiError::Internal(format!("Failed to build storage client: {e}")))?,
    );

    let pipeline = Arc::new(VerificationPipeline::new(
        extractor.clone(),
        verifier,
        Some(semantic_redactor.clone()),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: db_adapter,
        storage,
        extractor,
        summarizer,
        risk,
        chat,
        semantic_redactor,
        pipeline,
        redactor: Arc::new(Redactor::new()),
    });

    // --- 5. Configure CORS ---
    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/health", get(health_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/documents/verify", post(verify_document_handler))
        .route("/documents/redact", post(redact_document_handler))
        .route("/documents/analyze", post(analyze_document_handler))
        .route("/documents/upload", post(upload_document_handler))
        .route("/documents", get(list_documents_handler))
        .route("/chat", post(chat_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024))
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
