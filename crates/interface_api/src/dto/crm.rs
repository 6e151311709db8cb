//! CRM status and test DTOs

use serde::Serialize;

use domain_lead::adapters::{CloseConnection, HubSpotConnection};
use domain_lead::{CrmProvider, UpsertOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubSpotStats {
    pub contacts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSpotStatusResponse {
    pub configured: bool,
    pub connected: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<HubSpotStats>,
}

impl HubSpotStatusResponse {
    pub fn not_configured() -> Self {
        Self {
            configured: false,
            connected: false,
            message: "HubSpot API key not configured".to_string(),
            portal_id: None,
            stats: None,
        }
    }

    pub fn disconnected(error: impl Into<String>) -> Self {
        Self {
            configured: true,
            connected: false,
            message: error.into(),
            portal_id: None,
            stats: None,
        }
    }
}

impl From<HubSpotConnection> for HubSpotStatusResponse {
    fn from(connection: HubSpotConnection) -> Self {
        Self {
            configured: true,
            connected: true,
            message: "Connected to HubSpot".to_string(),
            portal_id: Some(connection.portal_id),
            stats: Some(HubSpotStats { contacts: connection.contact_count }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseStats {
    pub leads: u64,
    pub contacts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseStatusResponse {
    pub configured: bool,
    pub connected: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CloseStats>,
}

impl CloseStatusResponse {
    pub fn not_configured() -> Self {
        Self::unconnected(false, "Close.com API key not configured".to_string())
    }

    pub fn disconnected(error: impl Into<String>) -> Self {
        Self::unconnected(true, error.into())
    }

    fn unconnected(configured: bool, message: String) -> Self {
        Self {
            configured,
            connected: false,
            message,
            user: None,
            organization: None,
            organization_id: None,
            leads_url: None,
            stats: None,
        }
    }
}

impl From<CloseConnection> for CloseStatusResponse {
    fn from(connection: CloseConnection) -> Self {
        Self {
            configured: true,
            connected: true,
            message: "Connected to Close.com".to_string(),
            user: Some(connection.user),
            organization: Some(connection.organization),
            organization_id: connection.organization_id,
            leads_url: connection.leads_url,
            stats: Some(CloseStats {
                leads: connection.lead_count,
                contacts: connection.contact_count,
            }),
        }
    }
}

/// Result of pushing the synthetic test lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmTestResponse {
    pub success: bool,
    pub message: String,
    pub email: String,
    pub remote_id: String,
    pub is_new: bool,
}

impl CrmTestResponse {
    pub fn new(provider: CrmProvider, email: String, outcome: UpsertOutcome) -> Self {
        let action = if outcome.is_new { "created" } else { "updated" };
        Self {
            success: true,
            message: format!("Test lead {} in {}", action, provider.display_name()),
            email,
            remote_id: outcome.remote_id,
            is_new: outcome.is_new,
        }
    }
}
