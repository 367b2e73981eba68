//! AgeWise - age-aware health chat backend
//!
//! Serves per-session chat controllers that greet users by their estimated
//! age, offer parenting mode to adults and relay questions to Gemini.

mod age;
mod api;
mod db;
mod health_prompt;
mod llm;
mod replies;
mod runtime;
mod state_machine;
mod topics;

use api::{create_router, AppState};
use db::Database;
use llm::ChatConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agewise=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let db_path = std::env::var("AGEWISE_DB_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.agewise/agewise.db")
    });

    let port: u16 = std::env::var("AGEWISE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %db_path, "Opening database");
    let db = Database::open(&db_path)?;

    let chat_config = ChatConfig::from_env();
    if chat_config.gemini_api_key.is_none() {
        tracing::warn!("No chat provider configured. Set GEMINI_API_KEY.");
    }
    let chat_service = chat_config.build_service();
    tracing::info!(model = %chat_service.model_id(), "Chat service initialized");

    let state = AppState::new(db, chat_service);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("AgeWise server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
