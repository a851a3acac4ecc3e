//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        GeminiAidAdapter, GeminiClient, GeminiEnrichmentAdapter, GeminiExtractionAdapter,
        ImagenMindMapAdapter, RestDocumentStore,
    },
    config::Config,
    error::ApiError,
    web::{
        explain_concept_handler, extract_text_handler, generate_aid_handler,
        get_profile_handler, get_session_handler, practical_examples_handler,
        quiz_answer_handler, rest::ApiDoc, save_profile_handler, state::AppState,
        upload_image_handler,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
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

    // --- 2. Initialize Service Adapters ---
    let http_client = reqwest::Client::new();

    let gemini_client = GeminiClient::new(
        http_client.clone(),
        config.generation_base_url.clone(),
        config.generation_model.clone(),
        config.google_ai_api_key.clone(),
    );
    let extraction_adapter = Arc::new(GeminiExtractionAdapter::new(gemini_client.clone()));
    let aid_adapter = Arc::new(GeminiAidAdapter::new(gemini_client.clone()));
    let enrichment_adapter = Arc::new(GeminiEnrichmentAdapter::new(gemini_client));
    let mind_map_adapter = Arc::new(ImagenMindMapAdapter::new(
        http_client.clone(),
        config.generation_base_url.clone(),
        config.image_model.clone(),
        config.google_ai_api_key.clone(),
    ));
    let store_adapter = Arc::new(RestDocumentStore::new(
        http_client,
        config.store_base_url.clone(),
    ));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        extraction_adapter,
        aid_adapter,
        enrichment_adapter,
        mind_map_adapter,
        store_adapter,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/session", get(get_session_handler))
        .route("/session/image", post(upload_image_handler))
        .route("/session/extraction", post(extract_text_handler))
        .route("/session/aids/{aid_type}", post(generate_aid_handler))
        .route("/session/explanations", post(explain_concept_handler))
        .route("/session/examples", post(practical_examples_handler))
        .route("/session/quiz/answers", post(quiz_answer_handler))
        .route("/profile", get(get_profile_handler).put(save_profile_handler))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
