//! Pulse Gateway — real-time subscription fan-out service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use pulse_api::{AppState, build_router};
use pulse_auth::JwtTokenValidator;
use pulse_core::config::GatewayConfig;
use pulse_core::config::broker::BrokerProvider;
use pulse_core::error::AppError;
use pulse_realtime::bus::{EventBus, MemoryEventBus, RedisEventBus};
use pulse_realtime::connection::authenticator::ConnectionAuthenticator;
use pulse_realtime::filter::predicates::AllowAllPolicy;
use pulse_realtime::server::RealtimeGateway;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment.
fn load_configuration() -> Result<GatewayConfig, AppError> {
    let env = std::env::var("PULSE_ENV").unwrap_or_else(|_| "development".to_string());
    GatewayConfig::load(&env)
}

/// Initialize tracing/logging.
fn init_logging(config: &GatewayConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: GatewayConfig) -> Result<(), AppError> {
    tracing::info!("Starting Pulse gateway v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Event bus ────────────────────────────────────────
    let bus: Arc<dyn EventBus> = match config.broker.provider {
        BrokerProvider::Redis => Arc::new(RedisEventBus::connect(&config.broker).await?),
        BrokerProvider::Memory => {
            tracing::warn!("Using in-memory event bus; multi-instance fan-out disabled");
            Arc::new(MemoryEventBus::new(config.realtime.outbound_buffer_size))
        }
    };

    // ── Step 2: Authentication ───────────────────────────────────
    let validator = Arc::new(JwtTokenValidator::new(&config.auth));
    let authenticator = Arc::new(ConnectionAuthenticator::new(validator, config.auth.mode));

    // ── Step 3: Gateway engine + delivery loop ───────────────────
    let gateway = Arc::new(RealtimeGateway::new(
        &config,
        bus,
        Arc::new(AllowAllPolicy),
    ));
    gateway.start().await?;

    // ── Step 4: HTTP surface ─────────────────────────────────────
    let state = AppState {
        config: Arc::new(config.clone()),
        gateway: gateway.clone(),
        authenticator,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Pulse gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    gateway.shutdown().await;
    Ok(())
}

/// Resolves when the process receives a termination signal.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}
