//! In-memory Lead Adapter
//!
//! Implements the `LeadRepository` port over a `Vec<Lead>` guarded by a
//! `tokio::sync::RwLock`. Writes take the exclusive lock, so ids and
//! insertion order are assigned one submission at a time; reads share the
//! lock and return a snapshot.
//!
//! # Example
//!
//! ```rust
//! use domain_lead::{LeadRepository, NewLead};
//! use infra_store::InMemoryLeadRepository;
//!
//! # tokio_test_block(async {
//! let repository = InMemoryLeadRepository::new();
//! let lead = repository.create_lead(NewLead::new("Jane Doe", "jane@example.com")).await.unwrap();
//! assert_eq!(repository.get_all_leads().await.unwrap(), vec![lead]);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_lead::{Lead, LeadRepository, NewLead};

/// Process-local, append-only lead store
///
/// Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<Vec<Lead>>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored leads
    pub async fn count(&self) -> usize {
        self.leads.read().await.len()
    }
}

impl DomainPort for InMemoryLeadRepository {}

#[async_trait]
impl HealthCheckable for InMemoryLeadRepository {
    /// Always healthy; reports how many leads are held
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let count = self.count().await;

        HealthCheckResult {
            adapter_id: "in-memory-lead-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: start.elapsed().as_millis() as u64,
            message: Some(format!("{} leads stored", count)),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    #[instrument(skip(self, lead), fields(email = %lead.email))]
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, PortError> {
        let lead = Lead::create(lead);

        let mut leads = self.leads.write().await;
        leads.push(lead.clone());
        debug!(lead_id = %lead.id, total = leads.len(), "Lead appended");

        Ok(lead)
    }

    async fn get_all_leads(&self) -> Result<Vec<Lead>, PortError> {
        Ok(self.leads.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_count() {
        let repository = InMemoryLeadRepository::new();
        repository
            .create_lead(NewLead::new("Jane Doe", "jane@example.com"))
            .await
            .unwrap();

        let health = repository.health_check().await;
        assert!(health.is_operational());
        assert_eq!(health.message.as_deref(), Some("1 leads stored"));
    }
}
