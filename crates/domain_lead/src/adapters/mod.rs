//! External CRM Adapters
//!
//! This module provides the adapter implementations that forward leads to
//! external CRM systems. Each adapter implements the `CrmAdapter` trait so
//! the intake service can treat them uniformly.
//!
//! # Available Adapters
//!
//! - **HubSpotAdapter**: HubSpot CRM v3 contacts, bearer token auth
//! - **CloseAdapter**: Close.com leads and contacts, API key basic auth
//! - **MockCrmAdapter**: scripted adapter for tests (re-exported from ports module)
//!
//! # Usage
//!
//! Build the registry once at startup from whatever credentials are present:
//!
//! ```rust,ignore
//! use domain_lead::adapters::{CrmRegistry, CrmSettings, HubSpotConfig};
//!
//! let settings = CrmSettings {
//!     hubspot: Some(HubSpotConfig::new("pat-na1-...")),
//!     close: None,
//! };
//!
//! let registry = CrmRegistry::from_settings(settings)?;
//! registry.verify_field_mappings().await?;
//! let adapters = registry.configured();
//! ```

pub mod close;
pub mod http;
pub mod hubspot;

use std::sync::Arc;

use tracing::info;

use core_kernel::PortError;

use crate::ports::{CrmAdapter, CrmProvider};

pub use close::{CloseAdapter, CloseConfig, CloseConnection};
pub use http::{normalize_error_body, CrmAuth, CrmHttpClient};
pub use hubspot::{ContactLookup, HubSpotAdapter, HubSpotConfig, HubSpotConnection};

/// Per-provider adapter configuration; `None` disables the provider
#[derive(Debug, Clone, Default)]
pub struct CrmSettings {
    pub hubspot: Option<HubSpotConfig>,
    pub close: Option<CloseConfig>,
}

/// The CRM adapters enabled for this process
#[derive(Debug, Clone, Default)]
pub struct CrmRegistry {
    hubspot: Option<Arc<HubSpotAdapter>>,
    close: Option<Arc<CloseAdapter>>,
}

impl CrmRegistry {
    /// Builds an adapter for every provider with a non-blank credential
    pub fn from_settings(settings: CrmSettings) -> Result<Self, PortError> {
        let hubspot = settings
            .hubspot
            .filter(|c| !c.access_token.trim().is_empty())
            .map(HubSpotAdapter::new)
            .transpose()?
            .map(Arc::new);
        let close = settings
            .close
            .filter(|c| !c.api_key.trim().is_empty())
            .map(CloseAdapter::new)
            .transpose()?
            .map(Arc::new);

        let registry = Self { hubspot, close };
        info!(
            hubspot = registry.is_configured(CrmProvider::HubSpot),
            close = registry.is_configured(CrmProvider::Close),
            "CRM integrations configured"
        );
        Ok(registry)
    }

    /// A registry with no CRM enabled
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hubspot(&self) -> Option<&Arc<HubSpotAdapter>> {
        self.hubspot.as_ref()
    }

    pub fn close(&self) -> Option<&Arc<CloseAdapter>> {
        self.close.as_ref()
    }

    pub fn is_configured(&self, provider: CrmProvider) -> bool {
        match provider {
            CrmProvider::HubSpot => self.hubspot.is_some(),
            CrmProvider::Close => self.close.is_some(),
        }
    }

    /// The adapter for a provider, if enabled
    pub fn adapter(&self, provider: CrmProvider) -> Option<Arc<dyn CrmAdapter>> {
        match provider {
            CrmProvider::HubSpot => self.hubspot.clone().map(|a| a as Arc<dyn CrmAdapter>),
            CrmProvider::Close => self.close.clone().map(|a| a as Arc<dyn CrmAdapter>),
        }
    }

    /// Enabled adapters in fan-out order
    pub fn configured(&self) -> Vec<Arc<dyn CrmAdapter>> {
        CrmProvider::ALL
            .into_iter()
            .filter_map(|provider| self.adapter(provider))
            .collect()
    }

    /// Verifies every enabled adapter's field mapping, stopping at the first failure
    pub async fn verify_field_mappings(&self) -> Result<(), PortError> {
        for adapter in self.configured() {
            adapter.verify_field_mapping().await?;
            info!(provider = adapter.provider().key(), "Field mapping verified");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credentials_disable_provider() {
        let registry = CrmRegistry::from_settings(CrmSettings {
            hubspot: Some(HubSpotConfig::new("   ")),
            close: Some(CloseConfig::new("api_key")),
        })
        .unwrap();

        assert!(!registry.is_configured(CrmProvider::HubSpot));
        assert!(registry.is_configured(CrmProvider::Close));
        assert_eq!(registry.configured().len(), 1);
    }

    #[test]
    fn test_configured_follows_provider_order() {
        let registry = CrmRegistry::from_settings(CrmSettings {
            hubspot: Some(HubSpotConfig::new("pat")),
            close: Some(CloseConfig::new("api_key")),
        })
        .unwrap();

        let order: Vec<_> = registry.configured().iter().map(|a| a.provider()).collect();
        assert_eq!(order, CrmProvider::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_empty_registry_verifies_trivially() {
        let registry = CrmRegistry::empty();
        assert!(registry.configured().is_empty());
        assert!(registry.verify_field_mappings().await.is_ok());
    }
}
