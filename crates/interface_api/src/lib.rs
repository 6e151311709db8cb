//! HTTP API Layer
//!
//! This crate provides the REST API for the lead intake service using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Lead submission/listing, CRM status and test, health
//! - **Middleware**: Request ids, tracing, request logging, CORS
//! - **DTOs**: Response envelopes
//! - **Error Handling**: `{success: false, message, errors?}` responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(service, registry, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_lead::{CrmRegistry, LeadIntakeService};

use crate::config::ApiConfig;
use crate::handlers::{crm, health, leads};
use crate::middleware::request_log_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LeadIntakeService>,
    pub registry: Arc<CrmRegistry>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(service: LeadIntakeService, registry: CrmRegistry, config: ApiConfig) -> Self {
        Self {
            service: Arc::new(service),
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Intake service, CRM registry and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let mut api_routes = Router::new()
        .route("/leads", post(leads::submit_lead).get(leads::list_leads))
        .route("/hubspot/status", get(crm::hubspot_status))
        .route("/close/status", get(crm::close_status));

    // These write to the live CRMs
    if state.config.enable_crm_test_endpoints {
        api_routes = api_routes
            .route("/hubspot/test", post(crm::hubspot_test))
            .route("/close/test", post(crm::close_test));
    }

    let api_routes = api_routes.layer(axum_middleware::from_fn(request_log_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
