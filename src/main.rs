//! Rulegate API - Rules & Integration Governance
//!
//! Every editable entity of the platform (rules, rule sets, scaffolds, run
//! controls, UI metadata and dynamic data records) moves through the same
//! two-stage approval workflow:
//!
//! - Authors save drafts and submit them for peer review
//! - Peer reviewers approve or reject at the first gate
//! - Approvers approve or reject at the final gate
//! - Only approved entities can be activated

mod audit;
mod auth;
mod config;
mod dashboard;
mod entities;
mod error;
mod models;
mod routes;
mod state;
mod workflow;

use crate::config::{LogFormat, Settings};
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    init_tracing(settings.log_format);

    info!("🚀 Starting Rulegate - Rules & Integration Governance...");
    info!("📋 Configuration loaded successfully");

    if settings.auth.insecure_default {
        warn!("⚠️  JWT_SECRET not set, using default (INSECURE - set in production!)");
    }

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    let state = Arc::new(AppState::new(settings));

    // Build the router
    let app = create_router(state);

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Entity Editor ───");
    info!("   GET  /api/entities                 - List entities (?kind=&status=)");
    info!("   POST /api/entities                 - Save a new draft");
    info!("   GET  /api/entities/{{id}}            - Get entity and available actions");
    info!("   PUT  /api/entities/{{id}}            - Edit a draft or rejected entity");
    info!("   POST /api/entities/{{id}}/actions    - Apply a workflow action");
    info!("   PUT  /api/entities/{{id}}/lifecycle  - Activate / deactivate");
    info!("   GET  /api/entities/{{id}}/audit      - Workflow history");
    info!("");
    info!("   ─── Approvals Dashboard ───");
    info!("   GET  /api/approvals                - Review queues (?scope=definitions|data)");
    info!("   POST /api/approvals/bulk           - Bulk approve / reject");
    info!("   GET  /api/audit                    - Full audit log");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rulegate_api=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .compact(),
            )
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
