//! SafeFlow command center - venue monitoring with AI-assisted analysis.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use venue_gateway::api;
use venue_gateway::transport::{CredentialStore, GeminiTransport};
use venue_gateway::venue::{CrowdSimulator, VenueState};
use venue_gateway::{AppState, Config, GatewaySettings, InferenceGateway};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("safeflow-command-center {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| format!("Failed to load configuration: {}", e))?;
    tracing::info!("Starting safeflow-command-center {}", VERSION);

    let credentials = Arc::new(CredentialStore::new(config.inference.api_key.clone()));
    if !credentials.is_configured() {
        tracing::warn!("No API key configured; AI features will use fallbacks until one is set");
    }

    let transport = Arc::new(GeminiTransport::new(
        &config.inference.base_url,
        credentials.clone(),
    ));
    let gateway = Arc::new(InferenceGateway::new(
        transport,
        GatewaySettings::from(&config),
    ));
    tracing::info!(
        "Inference gateway ready: reasoning={}, fast={}, min gap={}ms",
        config.inference.reasoning_model,
        config.inference.fast_model,
        config.throttle.min_request_gap_ms
    );

    let venue = Arc::new(RwLock::new(VenueState::seeded()));

    if config.simulation.enabled {
        let simulator = CrowdSimulator::new(venue.clone(), config.simulation.interval());
        tokio::spawn(simulator.run());
        tracing::info!(
            "Crowd simulation enabled, every {}s",
            config.simulation.interval_secs
        );
    }

    let state = Arc::new(AppState::new(config.clone(), gateway, credentials, venue));
    let app = api::app(state);

    // Start server
    let addr = format!("{}:{}", config.api.host, config.api.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
