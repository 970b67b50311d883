//! Webhook server for the Tavola WhatsApp bot.
//!
//! Hosts the inbound webhook, the operational job surface, and the
//! campaign scheduling API, and runs the scheduler poller alongside the
//! HTTP server.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use database::Database;
use dispatcher::WhatsAppSender;
use scheduler::{Poller, PollerConfig};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use whatsapp_gateway::{GatewayConfig, WhatsAppClient};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting webhook server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Gateway client. An unreachable gateway must not block boot: the
    // webhook still answers customers through its own reply path.
    let gateway_config = GatewayConfig::new(
        &config.gateway_base_url,
        &config.gateway_account_sid,
        &config.gateway_auth_token,
        &config.from_number,
    );
    let client = WhatsAppClient::new(gateway_config)?;
    match client.health_check().await {
        Ok(true) => info!("Gateway reachable"),
        Ok(false) => warn!("Gateway health check returned failure"),
        Err(e) => warn!(error = %e, "Gateway health check failed"),
    }
    let sender: Arc<dyn dispatcher::MessageSender> = Arc::new(WhatsAppSender::new(client));

    // Scheduler poller runs next to the HTTP server.
    let poller = Poller::new(
        db.clone(),
        Arc::clone(&sender),
        PollerConfig {
            poll_interval: config.poll_interval,
            ..PollerConfig::default()
        },
    );
    tokio::spawn(poller.run());

    // Build application state and router
    let state = AppState::new(db, sender);
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Webhook server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
