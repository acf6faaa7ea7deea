//! MedIntake - guided conversational intake
//!
//! A Rust backend driving a fixed number of question/answer exchanges with
//! a subject, one dialogue engine per session.

mod api;
mod capture;
mod config;
mod draft;
mod generator;
mod message_log;
mod progress;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use capture::ScriptedCapture;
use config::ServerConfig;
use generator::{LoggingGenerator, ResponseGenerator, ScriptedGenerator, TimeoutGenerator};
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
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
                .unwrap_or_else(|_| "medintake=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env()?;
    tracing::info!(
        total_steps = config.script.total_steps(),
        think_delay_ms = u64::try_from(config.think_delay.as_millis()).unwrap_or(u64::MAX),
        reply_timeout_ms = u64::try_from(config.reply_timeout.as_millis()).unwrap_or(u64::MAX),
        "Intake script loaded"
    );

    // Reply generation: scripted, bounded by the reply timeout
    let scripted: Arc<dyn ResponseGenerator> =
        Arc::new(ScriptedGenerator::from_script(&config.script).with_delay(config.think_delay));
    let bounded: Arc<dyn ResponseGenerator> =
        Arc::new(TimeoutGenerator::new(scripted, config.reply_timeout));
    let generator = Arc::new(LoggingGenerator::new(bounded, "scripted"));

    let capture = Arc::new(ScriptedCapture::new(
        config.script.capture_samples.clone(),
        config.capture_delay,
    ));

    // Create application state
    let sessions = SessionManager::new(config.script, generator, capture)
        .with_max_sessions(config.max_sessions);
    let state = AppState::new(sessions);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("MedIntake server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
