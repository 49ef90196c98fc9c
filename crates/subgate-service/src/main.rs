//! Subgate Service - Stripe subscription gateway
//!
//! This is the main entry point for the subgate service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subgate_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,subgate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Subgate Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        public_url = %config.public_url,
        base_path = %config.base_path,
        subscriptions_enabled = %config.subscriptions.enabled,
        stripe_configured = %config.subscriptions.stripe_secret_key.is_some(),
        "Service configuration loaded"
    );

    // Fails fast on bad configuration or an unreachable price
    let state = AppState::bootstrap(config.clone()).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        e
    })?;

    let app = create_router(state);
    tracing::info!("Router configured");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
