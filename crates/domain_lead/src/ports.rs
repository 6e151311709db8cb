//! Lead Domain Ports
//!
//! This module defines the port interfaces for the lead domain:
//!
//! - [`LeadRepository`]: the lead store. The production adapter is the
//!   in-memory store in `infra_store`; tests use [`mock::MockLeadRepository`].
//! - [`CrmAdapter`]: an external CRM that receives a copy of each lead. The
//!   HubSpot and Close.com adapters live in [`crate::adapters`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_lead::{LeadIntakeService, LeadRepository, CrmAdapter};
//! use std::sync::Arc;
//!
//! let repository: Arc<dyn LeadRepository> = Arc::new(InMemoryLeadRepository::new());
//! let adapters: Vec<Arc<dyn CrmAdapter>> = registry.configured();
//! let service = LeadIntakeService::new(repository, adapters);
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, HealthCheckable, PortError};

use crate::lead::{Lead, NewLead};

/// The CRM systems a lead can be forwarded to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrmProvider {
    HubSpot,
    Close,
}

impl CrmProvider {
    /// All providers, in fan-out order
    pub const ALL: [CrmProvider; 2] = [CrmProvider::HubSpot, CrmProvider::Close];

    /// Key used in JSON responses and logs
    pub fn key(&self) -> &'static str {
        match self {
            CrmProvider::HubSpot => "hubspot",
            CrmProvider::Close => "close",
        }
    }

    /// Human-readable product name
    pub fn display_name(&self) -> &'static str {
        match self {
            CrmProvider::HubSpot => "HubSpot",
            CrmProvider::Close => "Close.com",
        }
    }
}

impl fmt::Display for CrmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of a successful create-or-update against a CRM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    /// Identifier of the remote record (HubSpot contact id, Close lead id)
    pub remote_id: String,
    /// True if the remote record was created by this call
    pub is_new: bool,
}

impl UpsertOutcome {
    pub fn created(remote_id: impl Into<String>) -> Self {
        Self { remote_id: remote_id.into(), is_new: true }
    }

    pub fn updated(remote_id: impl Into<String>) -> Self {
        Self { remote_id: remote_id.into(), is_new: false }
    }
}

/// Port for the local lead store
///
/// The store is append-only: there is no update or delete operation.
#[async_trait]
pub trait LeadRepository: DomainPort + HealthCheckable {
    /// Stores a validated lead, assigning its id and creation timestamp
    ///
    /// # Returns
    ///
    /// The stored lead
    async fn create_lead(&self, lead: NewLead) -> Result<Lead, PortError>;

    /// Returns every stored lead in insertion order
    async fn get_all_leads(&self) -> Result<Vec<Lead>, PortError>;
}

/// Port for an external CRM that receives leads
///
/// Implementations upsert by email: an existing remote record with the same
/// email is updated, otherwise a new one is created.
#[async_trait]
pub trait CrmAdapter: DomainPort {
    /// The CRM this adapter talks to
    fn provider(&self) -> CrmProvider;

    /// Creates or updates the remote record for a lead
    async fn upsert_lead(&self, lead: &Lead) -> Result<UpsertOutcome, PortError>;

    /// Checks the configured field mapping against the provider's schema
    ///
    /// # Errors
    ///
    /// Returns `PortError::Validation` naming every mapped field the provider
    /// does not know, or the error raised while fetching the schema.
    async fn verify_field_mapping(&self) -> Result<(), PortError>;
}

// ============================================================================
// Mock Implementations
// ============================================================================

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    /// In-memory lead repository that can be told to fail writes
    #[derive(Debug, Default)]
    pub struct MockLeadRepository {
        leads: RwLock<Vec<Lead>>,
        fail_writes: AtomicBool,
        write_attempts: AtomicUsize,
    }

    impl MockLeadRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// A repository whose every write fails
        pub fn failing() -> Self {
            let repository = Self::default();
            repository.fail_writes.store(true, Ordering::SeqCst);
            repository
        }

        /// Number of `create_lead` calls, successful or not
        pub fn write_attempts(&self) -> usize {
            self.write_attempts.load(Ordering::SeqCst)
        }

        pub async fn len(&self) -> usize {
            self.leads.read().await.len()
        }
    }

    impl DomainPort for MockLeadRepository {}

    #[async_trait]
    impl HealthCheckable for MockLeadRepository {
        async fn health_check(&self) -> HealthCheckResult {
            let failing = self.fail_writes.load(Ordering::SeqCst);
            HealthCheckResult {
                adapter_id: "mock-lead-repository".to_string(),
                status: if failing { AdapterHealth::Unhealthy } else { AdapterHealth::Healthy },
                latency_ms: 0,
                message: None,
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl LeadRepository for MockLeadRepository {
        async fn create_lead(&self, lead: NewLead) -> Result<Lead, PortError> {
            self.write_attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::internal("mock lead store is failing writes"));
            }
            let lead = Lead::create(lead);
            self.leads.write().await.push(lead.clone());
            Ok(lead)
        }

        async fn get_all_leads(&self) -> Result<Vec<Lead>, PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::internal("mock lead store is unavailable"));
            }
            Ok(self.leads.read().await.clone())
        }
    }

    /// What a [`MockCrmAdapter`] does when called
    #[derive(Debug, Clone)]
    pub enum MockBehaviour {
        Create,
        Update,
        Fail(String),
        /// Sleeps before answering, to exercise timeouts
        Hang(Duration),
    }

    /// Scripted CRM adapter that records every call
    #[derive(Debug)]
    pub struct MockCrmAdapter {
        provider: CrmProvider,
        behaviour: MockBehaviour,
        calls: Mutex<Vec<String>>,
        journal: Option<Arc<Mutex<Vec<CrmProvider>>>>,
    }

    impl MockCrmAdapter {
        pub fn new(provider: CrmProvider, behaviour: MockBehaviour) -> Self {
            Self {
                provider,
                behaviour,
                calls: Mutex::new(Vec::new()),
                journal: None,
            }
        }

        /// Records the provider in a journal shared with other mocks
        pub fn with_journal(mut self, journal: Arc<Mutex<Vec<CrmProvider>>>) -> Self {
            self.journal = Some(journal);
            self
        }

        /// Emails of the leads this adapter was called with
        pub fn called_emails(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        pub fn call_count(&self) -> usize {
            self.called_emails().len()
        }
    }

    impl DomainPort for MockCrmAdapter {}

    #[async_trait]
    impl CrmAdapter for MockCrmAdapter {
        fn provider(&self) -> CrmProvider {
            self.provider
        }

        async fn upsert_lead(&self, lead: &Lead) -> Result<UpsertOutcome, PortError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(lead.email.clone());
            }
            if let Some(journal) = &self.journal {
                if let Ok(mut journal) = journal.lock() {
                    journal.push(self.provider);
                }
            }

            let remote_id = format!("{}-{}", self.provider.key(), lead.id.as_uuid());
            match &self.behaviour {
                MockBehaviour::Create => Ok(UpsertOutcome::created(remote_id)),
                MockBehaviour::Update => Ok(UpsertOutcome::updated(remote_id)),
                MockBehaviour::Fail(message) => {
                    Err(PortError::remote(self.provider.display_name(), 500, message.clone()))
                }
                MockBehaviour::Hang(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(UpsertOutcome::created(remote_id))
                }
            }
        }

        async fn verify_field_mapping(&self) -> Result<(), PortError> {
            Ok(())
        }
    }
}
