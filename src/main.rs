//! Portfolio chat - guided conversation about an author and their work
//!
//! A Rust backend running a scripted dialogue state machine with timed
//! message delivery, streamed to the browser over SSE.

mod api;
mod config;
mod flow;
mod format;
mod project;
mod runtime;
mod state_machine;
mod transcript;

use api::{create_router, AppState};
use config::ChatConfig;
use runtime::{FlowCatalog, PortfolioFlows};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env();

    // Flow data is validated once, before any chat is mounted
    let flows = PortfolioFlows::new(&config.author).map_err(|e| {
        tracing::error!(error = %e, "Default conversation failed validation");
        e
    })?;
    let catalog: Arc<dyn FlowCatalog> = Arc::new(flows);

    tracing::info!(
        author = %config.author,
        delivery_delay_ms = u64::try_from(config.delivery_delay.as_millis()).unwrap_or(u64::MAX),
        asset_root = %config.asset_root,
        "Flow registry initialized"
    );

    // Create application state
    let state = AppState::new(catalog, &config);
    let sessions = Arc::clone(&state.sessions);
    let sweeper = if config.session_ttl.is_zero() {
        tracing::info!("Idle session eviction disabled");
        None
    } else {
        tracing::info!(ttl_secs = config.session_ttl.as_secs(), "Evicting idle sessions");
        Some(sessions.spawn_sweeper(config.session_ttl))
    };

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let mut app = create_router(state);
    if let Some(dir) = &config.asset_dir {
        if config.asset_root.starts_with('/') && config.asset_root.len() > 1 {
            tracing::info!(dir = %dir.display(), at = %config.asset_root, "Serving images");
            app = app.nest_service(&config.asset_root, ServeDir::new(dir));
        } else {
            tracing::warn!(
                asset_root = %config.asset_root,
                "Image directory ignored, asset root is not a local path"
            );
        }
    }
    let app = app
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Portfolio chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    sessions.shutdown().await;
    Ok(())
}
