//! Close.com CRM adapter
//!
//! A Close.com lead is a company-like container; the person lives in a
//! contact under it. Each submission therefore touches up to three objects:
//!
//! 1. the lead (found by `email:` query, created if missing)
//! 2. its first contact (updated, or created if the lead has none)
//! 3. a note with the social profiles that have no mapped custom field
//!
//! Lead status is never sent. Sales staff move leads through the pipeline by
//! hand and a form resubmission must not reset that.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use core_kernel::{DomainPort, PortError};

use crate::adapters::http::{CrmAuth, CrmHttpClient};
use crate::field_mapping::{ProviderFields, SocialField};
use crate::lead::Lead;
use crate::ports::{CrmAdapter, CrmProvider, UpsertOutcome};

pub const DEFAULT_BASE_URL: &str = "https://api.close.com/api/v1";
pub const DEFAULT_APP_URL: &str = "https://app.close.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Close.com adapter
#[derive(Debug, Clone)]
pub struct CloseConfig {
    pub api_key: String,
    pub base_url: String,
    /// Base of the web app, used for operator links
    pub app_url: String,
    /// Timeout for each HTTP request
    pub timeout: Duration,
    /// Lead custom field ids for social profiles
    pub fields: ProviderFields,
}

impl CloseConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            fields: ProviderFields::default(),
        }
    }
}

/// Connection details for the operator status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseConnection {
    pub user: String,
    pub organization: String,
    pub organization_id: Option<String>,
    pub lead_count: u64,
    pub contact_count: u64,
    pub leads_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    total_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Organization {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Me {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    organizations: Vec<Organization>,
}

#[derive(Debug, Serialize)]
struct EmailEntry<'a> {
    email: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct PhoneEntry<'a> {
    phone: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ContactBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_id: Option<&'a str>,
    name: &'a str,
    emails: Vec<EmailEntry<'a>>,
    phones: Vec<PhoneEntry<'a>>,
}

impl<'a> ContactBody<'a> {
    fn for_lead(lead: &'a Lead, lead_id: Option<&'a str>) -> Self {
        Self {
            lead_id,
            name: &lead.name,
            emails: vec![EmailEntry { email: &lead.email, kind: "office" }],
            phones: lead
                .phone
                .as_deref()
                .map(|phone| vec![PhoneEntry { phone, kind: "office" }])
                .unwrap_or_default(),
        }
    }
}

/// Close.com adapter implementing `CrmAdapter`
#[derive(Debug)]
pub struct CloseAdapter {
    http: CrmHttpClient,
    app_url: String,
    fields: ProviderFields,
}

impl CloseAdapter {
    pub fn new(config: CloseConfig) -> Result<Self, PortError> {
        let http = CrmHttpClient::new(
            "Close.com",
            config.base_url,
            CrmAuth::BasicApiKey(config.api_key),
            config.timeout,
        )?;

        Ok(Self {
            http,
            app_url: config.app_url.trim_end_matches('/').to_string(),
            fields: config.fields,
        })
    }

    /// Lead body: name plus any social values mapped to custom fields
    pub fn lead_body(&self, lead: &Lead) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("name".into(), json!(lead.name));
        for (field, field_id) in self.fields.mapped() {
            if let Some(value) = field.value_of(lead) {
                body.insert(format!("custom.{}", field_id), json!(value));
            }
        }
        body
    }

    /// Note text for social values without a custom field, if any
    pub fn social_note(&self, lead: &Lead) -> Option<String> {
        let lines: Vec<String> = SocialField::ALL
            .into_iter()
            .filter(|field| self.fields.slug(*field).is_none())
            .filter_map(|field| field.value_of(lead).map(|v| format!("{}: {}", field.label(), v)))
            .collect();

        if lines.is_empty() {
            return None;
        }
        Some(format!("Social Profiles:\n{}", lines.join("\n")))
    }

    /// Creates a lead + contact, or updates the lead already holding this email
    pub async fn create_or_update_lead(&self, lead: &Lead) -> Result<UpsertOutcome, PortError> {
        info!(provider = "close", email = %lead.email, "Creating/updating Close.com lead");

        match self.find_lead_by_email(&lead.email).await {
            Ok(Some(lead_id)) => return self.update_existing(&lead_id, lead).await,
            Ok(None) => debug!(provider = "close", "No lead with this email, creating one"),
            Err(err) => {
                warn!(provider = "close", error = %err, "Lead search failed, creating a new lead")
            }
        }

        self.create_new(lead).await
    }

    /// First lead whose contacts carry the email
    pub async fn find_lead_by_email(&self, email: &str) -> Result<Option<String>, PortError> {
        let response: ListResponse<Record> = self
            .http
            .get("/lead/", &[("query", format!("email:{}", email))])
            .await?;
        Ok(response.data.into_iter().next().map(|r| r.id))
    }

    async fn update_existing(&self, lead_id: &str, lead: &Lead) -> Result<UpsertOutcome, PortError> {
        let _: Value = self
            .http
            .put(&format!("/lead/{}", lead_id), &self.lead_body(lead))
            .await?;

        let contacts: ListResponse<Record> = self
            .http
            .get("/contact/", &[("lead_id", lead_id.to_string())])
            .await?;

        match contacts.data.first() {
            Some(contact) => {
                debug!(provider = "close", contact_id = %contact.id, "Updating existing contact");
                let _: Value = self
                    .http
                    .put(
                        &format!("/contact/{}", contact.id),
                        &ContactBody::for_lead(lead, None),
                    )
                    .await?;
            }
            None => {
                debug!(provider = "close", lead_id, "Lead has no contacts, creating one");
                let _: Record = self
                    .http
                    .post("/contact/", &ContactBody::for_lead(lead, Some(lead_id)))
                    .await?;
            }
        }

        self.attach_social_note(lead_id, lead).await?;
        info!(provider = "close", lead_id, "Updated existing Close.com lead");
        Ok(UpsertOutcome::updated(lead_id))
    }

    async fn create_new(&self, lead: &Lead) -> Result<UpsertOutcome, PortError> {
        let created: Record = self.http.post("/lead/", &self.lead_body(lead)).await?;

        let contact: Record = self
            .http
            .post("/contact/", &ContactBody::for_lead(lead, Some(&created.id)))
            .await?;
        debug!(provider = "close", contact_id = %contact.id, "Created contact");

        self.attach_social_note(&created.id, lead).await?;
        info!(provider = "close", lead_id = %created.id, "Created Close.com lead");
        Ok(UpsertOutcome::created(created.id))
    }

    async fn attach_social_note(&self, lead_id: &str, lead: &Lead) -> Result<(), PortError> {
        let Some(note) = self.social_note(lead) else {
            return Ok(());
        };
        let _: Record = self
            .http
            .post("/activity/note/", &json!({ "lead_id": lead_id, "note": note }))
            .await?;
        Ok(())
    }

    /// Read-only connectivity check for the operator status endpoint
    ///
    /// Fails only if `/me/` cannot be read; lead and contact totals are best
    /// effort and reported as 0 when unavailable.
    pub async fn connection_status(&self) -> Result<CloseConnection, PortError> {
        let me: Me = self.http.get("/me/", &[]).await?;

        let user = format!(
            "{} {}",
            me.first_name.unwrap_or_default(),
            me.last_name.unwrap_or_default()
        )
        .trim()
        .to_string();
        let organization = me.organizations.into_iter().next();
        let organization_id = organization.as_ref().and_then(|o| o.id.clone());
        let organization = organization
            .and_then(|o| o.name)
            .unwrap_or_else(|| "Unknown".to_string());

        let lead_count = self.count("/lead/").await;
        let contact_count = self.count("/contact/").await;
        let leads_url = organization_id
            .as_ref()
            .map(|id| format!("{}/organizations/{}/leads/", self.app_url, id));

        Ok(CloseConnection {
            user,
            organization,
            organization_id,
            lead_count,
            contact_count,
            leads_url,
        })
    }

    async fn count(&self, path: &str) -> u64 {
        match self
            .http
            .get::<ListResponse<Value>>(path, &[("_limit", "5".to_string())])
            .await
        {
            Ok(response) => response.total_results.unwrap_or(0),
            Err(err) => {
                warn!(provider = "close", path, error = %err, "Could not count Close.com records");
                0
            }
        }
    }
}

impl DomainPort for CloseAdapter {}

#[async_trait]
impl CrmAdapter for CloseAdapter {
    fn provider(&self) -> CrmProvider {
        CrmProvider::Close
    }

    async fn upsert_lead(&self, lead: &Lead) -> Result<UpsertOutcome, PortError> {
        self.create_or_update_lead(lead).await
    }

    async fn verify_field_mapping(&self) -> Result<(), PortError> {
        if self.fields.is_empty() {
            return Ok(());
        }
        let custom_fields: ListResponse<Record> = self.http.get("/custom_field/lead/", &[]).await?;
        self.fields
            .verify_against(
                CrmProvider::Close,
                custom_fields.data.iter().map(|f| f.id.as_str()),
            )
            .map_err(|e| PortError::validation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::NewLead;

    fn social_lead() -> Lead {
        let mut new = NewLead::new("Jane Doe", "jane@example.com");
        new.twitter_url = Some("https://x.com/jane".to_string());
        new.discord_username = Some("jane#0001".to_string());
        Lead::create(new)
    }

    fn adapter(fields: ProviderFields) -> CloseAdapter {
        CloseAdapter::new(CloseConfig { fields, ..CloseConfig::new("api_test") }).unwrap()
    }

    #[test]
    fn test_note_lists_unmapped_profiles() {
        let note = adapter(ProviderFields::default()).social_note(&social_lead()).unwrap();
        assert_eq!(
            note,
            "Social Profiles:\nTwitter: https://x.com/jane\nDiscord: jane#0001"
        );
    }

    #[test]
    fn test_mapped_profiles_move_to_custom_fields() {
        let close = adapter(ProviderFields {
            twitter: Some("cf_twitter".to_string()),
            discord: None,
        });
        let lead = social_lead();

        let body = close.lead_body(&lead);
        assert_eq!(body["custom.cf_twitter"], "https://x.com/jane");
        assert!(!body.contains_key("status"));
        assert_eq!(close.social_note(&lead).unwrap(), "Social Profiles:\nDiscord: jane#0001");
    }

    #[test]
    fn test_no_note_without_profiles() {
        let lead = Lead::create(NewLead::new("Jane", "jane@example.com"));
        assert!(adapter(ProviderFields::default()).social_note(&lead).is_none());
    }

    #[test]
    fn test_contact_body_shape() {
        let mut new = NewLead::new("Jane", "jane@example.com");
        new.phone = Some("+1 555 0100".to_string());
        let lead = Lead::create(new);

        let body = serde_json::to_value(ContactBody::for_lead(&lead, Some("lead_1"))).unwrap();
        assert_eq!(body["lead_id"], "lead_1");
        assert_eq!(body["emails"][0]["type"], "office");
        assert_eq!(body["phones"][0]["phone"], "+1 555 0100");

        let body = serde_json::to_value(ContactBody::for_lead(&lead, None)).unwrap();
        assert!(body.get("lead_id").is_none());
    }
}
