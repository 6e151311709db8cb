//! Lead DTOs
//!
//! The submission body is `domain_lead::LeadSubmission` itself; only the
//! response envelopes live here.

use serde::Serialize;

use domain_lead::{AdapterResult, CrmProvider, IntakeReceipt, Lead};

pub const SUBMITTED_MESSAGE: &str = "Lead information submitted successfully";

/// Result of forwarding the lead to one CRM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntegrationResult {
    /// `None` for skipped providers, which are left out of the response
    pub fn from_result(result: &AdapterResult) -> Option<Self> {
        match result {
            AdapterResult::Synced { remote_id, is_new } => Some(Self {
                success: true,
                is_new: Some(*is_new),
                remote_id: Some(remote_id.clone()),
                error: None,
            }),
            AdapterResult::Failed { reason } => Some(Self {
                success: false,
                is_new: None,
                remote_id: None,
                error: Some(reason.clone()),
            }),
            AdapterResult::Skipped => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Integrations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hubspot: Option<IntegrationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<IntegrationResult>,
}

#[derive(Debug, Serialize)]
pub struct SubmitLeadResponse {
    pub success: bool,
    pub message: String,
    pub data: Lead,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrations: Option<Integrations>,
}

impl From<IntakeReceipt> for SubmitLeadResponse {
    fn from(receipt: IntakeReceipt) -> Self {
        let hubspot = IntegrationResult::from_result(receipt.outcome(CrmProvider::HubSpot));
        let close = IntegrationResult::from_result(receipt.outcome(CrmProvider::Close));
        let integrations = (hubspot.is_some() || close.is_some())
            .then_some(Integrations { hubspot, close });

        Self {
            success: true,
            message: SUBMITTED_MESSAGE.to_string(),
            data: receipt.lead,
            integrations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Lead>,
}

impl From<Vec<Lead>> for LeadListResponse {
    fn from(leads: Vec<Lead>) -> Self {
        Self {
            success: true,
            count: leads.len(),
            data: leads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_lead::{IntegrationOutcome, NewLead};

    fn receipt(hubspot: AdapterResult, close: AdapterResult) -> IntakeReceipt {
        IntakeReceipt {
            lead: Lead::create(NewLead::new("Jane Doe", "jane@example.com")),
            integrations: vec![
                IntegrationOutcome { provider: CrmProvider::HubSpot, result: hubspot },
                IntegrationOutcome { provider: CrmProvider::Close, result: close },
            ],
        }
    }

    #[test]
    fn test_integrations_omitted_when_nothing_configured() {
        let response = SubmitLeadResponse::from(receipt(AdapterResult::Skipped, AdapterResult::Skipped));
        let json = serde_json::to_value(response).unwrap();

        assert_eq!(json["success"], true);
        assert!(json.get("integrations").is_none());
    }

    #[test]
    fn test_partial_failure_shape() {
        let response = SubmitLeadResponse::from(receipt(
            AdapterResult::Failed { reason: "HubSpot error (400): bad".into() },
            AdapterResult::Synced { remote_id: "lead_1".into(), is_new: true },
        ));
        let json = serde_json::to_value(response).unwrap();

        assert_eq!(
            json["integrations"]["hubspot"],
            serde_json::json!({ "success": false, "error": "HubSpot error (400): bad" })
        );
        assert_eq!(
            json["integrations"]["close"],
            serde_json::json!({ "success": true, "isNew": true, "remoteId": "lead_1" })
        );
    }
}
