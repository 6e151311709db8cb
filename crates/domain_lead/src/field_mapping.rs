//! CRM field mapping
//!
//! Social profile fields have no fixed home in either CRM: HubSpot stores
//! them in contact properties and Close.com in lead custom fields, and in
//! both cases the value that matters is the provider's internal slug (the
//! property `name` or the custom field id), never the label shown in the UI.
//!
//! The mapping is an explicit, versioned table loaded at startup:
//!
//! ```toml
//! version = 1
//!
//! [hubspot]
//! twitter = "twitterhandle"
//! discord = "discord_username"
//!
//! [close]
//! twitter = "cf_8Yd2vJ2v0bFZcQ2bAq6v9a"
//! ```
//!
//! Each adapter checks its part of the table against the provider schema
//! before first use (see `CrmAdapter::verify_field_mapping`).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use core_kernel::CoreError;

use crate::lead::Lead;
use crate::ports::CrmProvider;

/// The only mapping format version this build understands
pub const CURRENT_VERSION: u32 = 1;

/// Logical lead fields that need a provider-specific slug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialField {
    Twitter,
    Discord,
}

impl SocialField {
    pub const ALL: [SocialField; 2] = [SocialField::Twitter, SocialField::Discord];

    /// Label used in notes and diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            SocialField::Twitter => "Twitter",
            SocialField::Discord => "Discord",
        }
    }

    /// The lead's value for this field, if present
    pub fn value_of<'a>(&self, lead: &'a Lead) -> Option<&'a str> {
        match self {
            SocialField::Twitter => lead.twitter_url.as_deref(),
            SocialField::Discord => lead.discord_username.as_deref(),
        }
    }
}

impl fmt::Display for SocialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SocialField::Twitter => "twitter",
            SocialField::Discord => "discord",
        })
    }
}

/// Slugs for one provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFields {
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub discord: Option<String>,
}

impl ProviderFields {
    /// The slug mapped for a field; blank slugs count as unmapped
    pub fn slug(&self, field: SocialField) -> Option<&str> {
        let slug = match field {
            SocialField::Twitter => self.twitter.as_deref(),
            SocialField::Discord => self.discord.as_deref(),
        };
        slug.map(str::trim).filter(|s| !s.is_empty())
    }

    /// Mapped fields with their slugs
    pub fn mapped(&self) -> impl Iterator<Item = (SocialField, &str)> + '_ {
        SocialField::ALL
            .into_iter()
            .filter_map(move |field| self.slug(field).map(|slug| (field, slug)))
    }

    pub fn is_empty(&self) -> bool {
        self.mapped().next().is_none()
    }

    /// Checks every mapped slug against the slugs the provider reports
    ///
    /// # Errors
    ///
    /// Returns a configuration error listing every unknown slug.
    pub fn verify_against<'a>(
        &self,
        provider: CrmProvider,
        known: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), CoreError> {
        let known: HashSet<&str> = known.into_iter().collect();
        let missing: Vec<String> = self
            .mapped()
            .filter(|(_, slug)| !known.contains(slug))
            .map(|(field, slug)| format!("{} -> '{}'", field, slug))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        Err(CoreError::UnknownFields {
            owner: provider.to_string(),
            document: "field mapping",
            fields: missing,
        })
    }
}

/// Versioned table of logical field to provider slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub version: u32,
    #[serde(default)]
    pub hubspot: ProviderFields,
    #[serde(default)]
    pub close: ProviderFields,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            hubspot: ProviderFields {
                twitter: Some("twitterhandle".to_string()),
                discord: Some("discord_username".to_string()),
            },
            close: ProviderFields::default(),
        }
    }
}

impl FieldMapping {
    /// Rejects mapping files written for another format version
    pub fn check_version(&self) -> Result<(), CoreError> {
        if self.version != CURRENT_VERSION {
            return Err(CoreError::UnsupportedVersion {
                document: "field mapping",
                found: self.version,
                expected: CURRENT_VERSION,
            });
        }
        Ok(())
    }
}
