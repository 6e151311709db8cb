//! HubSpot CRM adapter
//!
//! Upserts leads as HubSpot contacts through the CRM v3 objects API.
//!
//! # Duplicate detection
//!
//! HubSpot is searched for an existing contact with the same email before
//! anything is written. Two strategies exist:
//!
//! - [`ContactLookup::PageScan`] (default): list one page of contacts and
//!   compare emails case-insensitively on our side. Contacts beyond that page
//!   are never seen, so a returning visitor whose contact sits further down
//!   the list gets a duplicate contact.
//! - [`ContactLookup::Search`]: server-side `EQ` filter on `email` through the
//!   search endpoint.
//!
//! A failed lookup is logged and treated as "not found".

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use core_kernel::{DomainPort, PortError};

use crate::adapters::http::{CrmAuth, CrmHttpClient};
use crate::field_mapping::{FieldMapping, ProviderFields};
use crate::lead::Lead;
use crate::ports::{CrmAdapter, CrmProvider, UpsertOutcome};

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";
pub const DEFAULT_LOOKUP_PAGE_SIZE: u32 = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";
const SEARCH_PATH: &str = "/crm/v3/objects/contacts/search";
const PROPERTIES_PATH: &str = "/crm/v3/properties/contacts";
const ACCOUNT_PATH: &str = "/account-info/v3/details";

/// How an existing contact is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactLookup {
    #[default]
    PageScan,
    Search,
}

/// Configuration for the HubSpot adapter
#[derive(Debug, Clone)]
pub struct HubSpotConfig {
    /// Private app access token
    pub access_token: String,
    pub base_url: String,
    /// Timeout for each HTTP request
    pub timeout: Duration,
    pub lookup: ContactLookup,
    /// Contacts listed per page-scan lookup
    pub lookup_page_size: u32,
    pub fields: ProviderFields,
}

impl HubSpotConfig {
    /// Configuration with defaults for everything but the token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            lookup: ContactLookup::default(),
            lookup_page_size: DEFAULT_LOOKUP_PAGE_SIZE,
            fields: FieldMapping::default().hubspot,
        }
    }
}

/// Connection details for the operator status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSpotConnection {
    pub portal_id: String,
    pub contact_count: u64,
}

#[derive(Debug, Deserialize)]
struct ContactRecord {
    id: String,
    #[serde(default)]
    properties: HashMap<String, Option<String>>,
}

impl ContactRecord {
    fn email(&self) -> Option<&str> {
        self.properties.get("email").and_then(|e| e.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ContactPage {
    #[serde(default)]
    results: Vec<ContactRecord>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    results: Vec<ContactRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountDetails {
    portal_id: Value,
}

#[derive(Debug, Deserialize)]
struct PropertyDefinition {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PropertyList {
    #[serde(default)]
    results: Vec<PropertyDefinition>,
}

/// HubSpot adapter implementing `CrmAdapter`
#[derive(Debug)]
pub struct HubSpotAdapter {
    http: CrmHttpClient,
    lookup: ContactLookup,
    lookup_page_size: u32,
    fields: ProviderFields,
}

impl HubSpotAdapter {
    /// Creates the adapter and its HTTP client
    pub fn new(config: HubSpotConfig) -> Result<Self, PortError> {
        let http = CrmHttpClient::new(
            "HubSpot",
            config.base_url,
            CrmAuth::Bearer(config.access_token),
            config.timeout,
        )?;

        Ok(Self {
            http,
            lookup: config.lookup,
            lookup_page_size: config.lookup_page_size.max(1),
            fields: config.fields,
        })
    }

    /// Contact properties written for a lead
    ///
    /// Optional values are only sent when present so that an update never
    /// blanks a field a salesperson filled in.
    pub fn contact_properties(&self, lead: &Lead) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert("email".into(), json!(lead.email));
        properties.insert("firstname".into(), json!(lead.first_name()));
        properties.insert("lastname".into(), json!(lead.last_name()));
        if let Some(phone) = &lead.phone {
            properties.insert("phone".into(), json!(phone));
        }
        for (field, slug) in self.fields.mapped() {
            if let Some(value) = field.value_of(lead) {
                properties.insert(slug.to_string(), json!(value));
            }
        }
        properties
    }

    /// Creates a contact for the lead or updates the one with the same email
    pub async fn create_or_update_contact(&self, lead: &Lead) -> Result<UpsertOutcome, PortError> {
        info!(provider = "hubspot", email = %lead.email, "Creating/updating HubSpot contact");
        let body = json!({ "properties": self.contact_properties(lead) });

        let existing = match self.find_contact_by_email(&lead.email).await {
            Ok(found) => found,
            Err(err) => {
                warn!(provider = "hubspot", error = %err, "Contact lookup failed, creating a new contact");
                None
            }
        };

        if let Some(contact_id) = existing {
            let updated: ContactRecord = self
                .http
                .patch(&format!("{}/{}", CONTACTS_PATH, contact_id), &body)
                .await?;
            info!(provider = "hubspot", contact_id = %updated.id, "Updated existing HubSpot contact");
            return Ok(UpsertOutcome::updated(updated.id));
        }

        let created: ContactRecord = self.http.post(CONTACTS_PATH, &body).await?;
        info!(provider = "hubspot", contact_id = %created.id, "Created HubSpot contact");
        Ok(UpsertOutcome::created(created.id))
    }

    /// Looks up a contact id by email using the configured strategy
    pub async fn find_contact_by_email(&self, email: &str) -> Result<Option<String>, PortError> {
        match self.lookup {
            ContactLookup::PageScan => self.scan_first_page(email).await,
            ContactLookup::Search => self.search_by_email(email).await,
        }
    }

    async fn scan_first_page(&self, email: &str) -> Result<Option<String>, PortError> {
        let page: ContactPage = self
            .http
            .get(
                CONTACTS_PATH,
                &[
                    ("limit", self.lookup_page_size.to_string()),
                    ("properties", "email".to_string()),
                ],
            )
            .await?;

        debug!(provider = "hubspot", scanned = page.results.len(), "Scanned contact page");
        Ok(page
            .results
            .into_iter()
            .find(|c| c.email().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .map(|c| c.id))
    }

    async fn search_by_email(&self, email: &str) -> Result<Option<String>, PortError> {
        let body = json!({
            "filterGroups": [{
                "filters": [{ "propertyName": "email", "operator": "EQ", "value": email }]
            }],
            "properties": ["email"],
            "limit": 1
        });
        let response: SearchResponse = self.http.post(SEARCH_PATH, &body).await?;
        Ok(response.results.into_iter().next().map(|c| c.id))
    }

    /// Read-only connectivity check for the operator status endpoint
    ///
    /// Fails only if the account details cannot be read; the contact count
    /// is best effort and reported as 0 when unavailable.
    pub async fn connection_status(&self) -> Result<HubSpotConnection, PortError> {
        let account: AccountDetails = self.http.get(ACCOUNT_PATH, &[]).await?;
        let portal_id = match account.portal_id {
            Value::String(s) => s,
            other => other.to_string(),
        };

        let contact_count = match self
            .http
            .post::<_, SearchResponse>(SEARCH_PATH, &json!({ "limit": 1 }))
            .await
        {
            Ok(response) => response.total,
            Err(err) => {
                warn!(provider = "hubspot", error = %err, "Could not count HubSpot contacts");
                0
            }
        };

        Ok(HubSpotConnection { portal_id, contact_count })
    }
}

impl DomainPort for HubSpotAdapter {}

#[async_trait]
impl CrmAdapter for HubSpotAdapter {
    fn provider(&self) -> CrmProvider {
        CrmProvider::HubSpot
    }

    async fn upsert_lead(&self, lead: &Lead) -> Result<UpsertOutcome, PortError> {
        self.create_or_update_contact(lead).await
    }

    async fn verify_field_mapping(&self) -> Result<(), PortError> {
        if self.fields.is_empty() {
            return Ok(());
        }
        let properties: PropertyList = self.http.get(PROPERTIES_PATH, &[]).await?;
        self.fields
            .verify_against(
                CrmProvider::HubSpot,
                properties.results.iter().map(|p| p.name.as_str()),
            )
            .map_err(|e| PortError::validation(e.to_string()))
    }
}
