//! Lead intake service
//!
//! Orchestrates one form submission end to end:
//!
//! ```text
//! Received -> Validated -> Stored -> Fanned-out -> Responded
//! ```
//!
//! Only validation and the store write can fail the submission. Once the lead
//! is stored, every configured CRM adapter is called in provider order and
//! each result is recorded on its own; a failing or slow CRM never stops the
//! next one from running and never turns the submission into an error.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::LeadError;
use crate::lead::Lead;
use crate::ports::{CrmAdapter, CrmProvider, LeadRepository};
use crate::validation::LeadSubmission;

/// Upper bound on a single adapter's upsert, on top of its HTTP timeouts
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(30);

/// What happened when a lead was forwarded to one CRM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdapterResult {
    /// The remote record was created or updated
    Synced { remote_id: String, is_new: bool },
    /// The provider has no credentials configured
    Skipped,
    /// The call failed or timed out
    Failed { reason: String },
}

/// Result for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationOutcome {
    pub provider: CrmProvider,
    pub result: AdapterResult,
}

/// A stored lead and what each CRM made of it
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReceipt {
    pub lead: Lead,
    /// One entry per provider, in provider order
    pub integrations: Vec<IntegrationOutcome>,
}

impl IntakeReceipt {
    /// Result for a provider (`Skipped` if it was never considered)
    pub fn outcome(&self, provider: CrmProvider) -> &AdapterResult {
        self.integrations
            .iter()
            .find(|o| o.provider == provider)
            .map(|o| &o.result)
            .unwrap_or(&AdapterResult::Skipped)
    }

    /// Outcomes for providers that were actually called
    pub fn attempted(&self) -> impl Iterator<Item = &IntegrationOutcome> {
        self.integrations
            .iter()
            .filter(|o| o.result != AdapterResult::Skipped)
    }
}

/// Service accepting lead submissions
pub struct LeadIntakeService {
    repository: Arc<dyn LeadRepository>,
    adapters: Vec<Arc<dyn CrmAdapter>>,
    adapter_timeout: Duration,
}

impl LeadIntakeService {
    /// Creates the service over a store and the enabled CRM adapters
    pub fn new(repository: Arc<dyn LeadRepository>, adapters: Vec<Arc<dyn CrmAdapter>>) -> Self {
        Self {
            repository,
            adapters,
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    pub fn repository(&self) -> &Arc<dyn LeadRepository> {
        &self.repository
    }

    pub fn configured_providers(&self) -> Vec<CrmProvider> {
        self.adapters.iter().map(|a| a.provider()).collect()
    }

    /// Validates, stores and forwards a submission
    ///
    /// # Errors
    ///
    /// - `LeadError::Validation` if the submission is invalid. Nothing is
    ///   stored and no CRM is called.
    /// - `LeadError::Storage` if the store write fails. No CRM is called.
    pub async fn submit(&self, submission: LeadSubmission) -> Result<IntakeReceipt, LeadError> {
        let new_lead = submission.into_new_lead().map_err(|errors| {
            info!(fields = %errors, "Lead submission rejected");
            LeadError::Validation(errors)
        })?;

        let lead = self.repository.create_lead(new_lead).await.map_err(|e| {
            error!(error = %e, "Failed to store lead");
            LeadError::Storage(e)
        })?;
        info!(lead_id = %lead.id, email = %lead.email, "Lead stored");

        let integrations = self.fan_out(&lead).await;
        Ok(IntakeReceipt { lead, integrations })
    }

    /// All stored leads in insertion order
    pub async fn list_leads(&self) -> Result<Vec<Lead>, LeadError> {
        self.repository.get_all_leads().await.map_err(LeadError::Storage)
    }

    async fn fan_out(&self, lead: &Lead) -> Vec<IntegrationOutcome> {
        let mut outcomes = Vec::with_capacity(CrmProvider::ALL.len());

        for provider in CrmProvider::ALL {
            let Some(adapter) = self.adapters.iter().find(|a| a.provider() == provider) else {
                outcomes.push(IntegrationOutcome { provider, result: AdapterResult::Skipped });
                continue;
            };

            let result = match tokio::time::timeout(self.adapter_timeout, adapter.upsert_lead(lead)).await {
                Ok(Ok(upsert)) => {
                    info!(
                        provider = provider.key(),
                        lead_id = %lead.id,
                        remote_id = %upsert.remote_id,
                        is_new = upsert.is_new,
                        "Lead synced to CRM"
                    );
                    AdapterResult::Synced { remote_id: upsert.remote_id, is_new: upsert.is_new }
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = provider.key(),
                        lead_id = %lead.id,
                        transient = e.is_transient(),
                        status = ?e.remote_status(),
                        error = %e,
                        "CRM sync failed"
                    );
                    AdapterResult::Failed { reason: e.to_string() }
                }
                Err(_) => {
                    let reason = format!(
                        "{} did not respond within {}ms",
                        provider.display_name(),
                        self.adapter_timeout.as_millis()
                    );
                    warn!(provider = provider.key(), lead_id = %lead.id, "{}", reason);
                    AdapterResult::Failed { reason }
                }
            };

            outcomes.push(IntegrationOutcome { provider, result });
        }

        outcomes
    }
}
