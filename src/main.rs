use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metergate::{
    config::GatewayConfig, listings, metrics::register_metrics, routes, state::AppState,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().expect("Failed to load configuration");
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();

    tracing::info!("Starting metergate on port {}", port);
    tracing::info!("Public URL: {}", config.public_url);
    tracing::info!("Forward timeout: {:?}", config.forward_timeout);

    // Register Prometheus metrics
    register_metrics();

    // Create shared state
    let state = AppState::new(config);

    // Pre-fund the demo wallet, if configured
    if let Some(ref wallet) = state.config.demo_wallet {
        match state.ledger.top_up(wallet, state.config.demo_balance) {
            Ok(balance) => tracing::info!(wallet = %wallet, balance, "funded demo wallet"),
            Err(e) => tracing::warn!("failed to fund demo wallet: {}", e),
        }
    }

    // Seed the registry from the listings store. Non-fatal: incremental
    // registration keeps working if the listings API is down at boot.
    if let Some(ref url) = state.config.listings_url {
        match listings::seed_registry(&state.http_client, url, &state.registry).await {
            Ok(count) => tracing::info!(count, "seeded registry from listings store"),
            Err(e) => tracing::warn!("registry seeding failed, starting empty: {}", e),
        }
    }

    let state_data = web::Data::new(state);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = metergate::cors::build_cors(&allowed_origins);

        App::new()
            .app_data(state_data.clone())
            .app_data(web::PayloadConfig::new(10 * 1024 * 1024)) // 10MB body limit
            .wrap(Logger::default())
            .wrap(cors)
            .configure(routes::health::configure)
            .configure(routes::register::configure)
            .configure(routes::balance::configure)
            .configure(routes::analytics::configure)
            // Proxy catch-all must come last so it never shadows /gateway/*
            .default_service(web::route().to(routes::gateway::gateway_proxy))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
