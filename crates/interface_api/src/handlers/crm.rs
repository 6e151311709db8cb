//! CRM status and test handlers
//!
//! Status checks are read-only. The test endpoints write a synthetic lead to
//! the live CRM and are only routed when explicitly enabled.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{info, warn};

use domain_lead::{CrmAdapter, CrmProvider, Lead, NewLead};

use crate::dto::crm::{CloseStatusResponse, CrmTestResponse, HubSpotStatusResponse};
use crate::{error::ApiError, AppState};

/// HubSpot connectivity and contact count
pub async fn hubspot_status(State(state): State<AppState>) -> Json<HubSpotStatusResponse> {
    let Some(adapter) = state.registry.hubspot() else {
        return Json(HubSpotStatusResponse::not_configured());
    };

    match adapter.connection_status().await {
        Ok(connection) => Json(connection.into()),
        Err(e) => {
            warn!(provider = "hubspot", error = %e, "HubSpot status check failed");
            Json(HubSpotStatusResponse::disconnected(e.to_string()))
        }
    }
}

/// Close.com connectivity, organization and record counts
pub async fn close_status(State(state): State<AppState>) -> Json<CloseStatusResponse> {
    let Some(adapter) = state.registry.close() else {
        return Json(CloseStatusResponse::not_configured());
    };

    match adapter.connection_status().await {
        Ok(connection) => Json(connection.into()),
        Err(e) => {
            warn!(provider = "close", error = %e, "Close.com status check failed");
            Json(CloseStatusResponse::disconnected(e.to_string()))
        }
    }
}

pub async fn hubspot_test(State(state): State<AppState>) -> Result<Json<CrmTestResponse>, ApiError> {
    push_test_lead(state.registry.adapter(CrmProvider::HubSpot), CrmProvider::HubSpot).await
}

pub async fn close_test(State(state): State<AppState>) -> Result<Json<CrmTestResponse>, ApiError> {
    push_test_lead(state.registry.adapter(CrmProvider::Close), CrmProvider::Close).await
}

/// A lead with a unique throwaway address
pub fn test_lead() -> Lead {
    let email = format!("test+{}@example.com", Utc::now().timestamp_millis());
    Lead::create(NewLead::new("Test Lead", email))
}

async fn push_test_lead(
    adapter: Option<Arc<dyn CrmAdapter>>,
    provider: CrmProvider,
) -> Result<Json<CrmTestResponse>, ApiError> {
    let adapter = adapter.ok_or_else(|| {
        ApiError::BadRequest(format!("{} API key not configured", provider.display_name()))
    })?;

    let lead = test_lead();
    let outcome = adapter.upsert_lead(&lead).await.map_err(|e| {
        warn!(provider = provider.key(), error = %e, "CRM test lead failed");
        ApiError::BadGateway(e.to_string())
    })?;

    info!(provider = provider.key(), remote_id = %outcome.remote_id, "CRM test lead pushed");
    Ok(Json(CrmTestResponse::new(provider, lead.email, outcome)))
}
