//! Lead Intake - API Server Binary
//!
//! This binary starts the HTTP API server for the landing page backend.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration (no CRM integrations)
//! cargo run --bin lead-intake-api
//!
//! # Forward leads to both CRMs
//! HUBSPOT_API_KEY=pat-na1-... CLOSE_API_KEY=api_... cargo run --bin lead-intake-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `API_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! * `API_ENABLE_CRM_TEST_ENDPOINTS` - Route the live CRM test endpoints (default: false)
//! * `API_FIELD_MAPPING_PATH` - TOML/JSON field mapping file (default: built-in mapping)
//! * `API_VALIDATE_FIELD_MAPPING` - Verify the mapping against the CRMs at startup (default: true)
//! * `HUBSPOT_API_KEY`, `CLOSE_API_KEY` - CRM credentials; unset or blank disables the CRM
//! * `HUBSPOT_BASE_URL`, `CLOSE_BASE_URL` - API base URL overrides
//! * `HUBSPOT_LOOKUP` - `page_scan` or `search` (default: page_scan)
//! * `HUBSPOT_LOOKUP_PAGE_SIZE` - Contacts scanned per lookup (default: 100)
//! * `CRM_TIMEOUT_SECS` - Per-request CRM timeout (default: 10)
//! * `CRM_ADAPTER_TIMEOUT_SECS` - Per-CRM budget during a submission (default: 30)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_lead::{CrmRegistry, LeadIntakeService};
use infra_store::InMemoryLeadRepository;
use interface_api::config::{ApiConfig, CrmConfig, LogFormat};
use interface_api::{create_router, AppState};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, builds and verifies the CRM
/// adapters, and starts the HTTP server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration or the field mapping file is invalid
/// - Field mapping verification against a CRM fails
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let (config, crm_config) = load_config()?;

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Lead Intake API Server"
    );

    let mapping = config
        .load_field_mapping()
        .context("failed to load CRM field mapping")?;
    let registry = CrmRegistry::from_settings(crm_config.settings(&mapping))
        .context("failed to build CRM adapters")?;

    if config.validate_field_mapping {
        registry
            .verify_field_mappings()
            .await
            .context("CRM field mapping does not match the provider schema")?;
    } else {
        tracing::warn!("CRM field mapping validation disabled");
    }

    let repository = Arc::new(InMemoryLeadRepository::new());
    let service = LeadIntakeService::new(repository, registry.configured())
        .with_adapter_timeout(crm_config.adapter_timeout());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    let app = create_router(AppState::new(service, registry, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API and CRM configuration from environment variables.
///
/// Unset variables fall back to their defaults.
fn load_config() -> anyhow::Result<(ApiConfig, CrmConfig)> {
    let config = ApiConfig::from_env().context("invalid API_* configuration")?;
    let crm_config = CrmConfig::from_env().context("invalid CRM configuration")?;
    Ok((config, crm_config))
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests, including their CRM fan-out, complete before the
/// process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
