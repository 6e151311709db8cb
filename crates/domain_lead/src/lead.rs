//! Lead entity
//!
//! A lead is a visitor's submitted contact record. Leads are created exactly
//! once per accepted form submission and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::LeadId;

/// A stored lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Process-local unique identifier
    pub id: LeadId,
    /// Display name as entered by the visitor
    pub name: String,
    /// Email address, the natural key used against both CRMs
    pub email: String,
    pub phone: Option<String>,
    pub twitter_url: Option<String>,
    pub discord_username: Option<String>,
    pub referred_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for the lead store
///
/// Produced by [`LeadSubmission::into_new_lead`](crate::validation::LeadSubmission::into_new_lead);
/// optional fields are already normalized (blank values are `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub twitter_url: Option<String>,
    pub discord_username: Option<String>,
    pub referred_by: Option<String>,
}

impl NewLead {
    /// Creates a new lead input with only the required fields
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            twitter_url: None,
            discord_username: None,
            referred_by: None,
        }
    }
}

impl Lead {
    /// Creates a lead from validated input, assigning a fresh id and timestamp
    pub fn create(new: NewLead) -> Self {
        Self {
            id: LeadId::new(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            twitter_url: new.twitter_url,
            discord_username: new.discord_username,
            referred_by: new.referred_by,
            created_at: Utc::now(),
        }
    }

    /// First name, used for CRM mapping
    pub fn first_name(&self) -> &str {
        split_name(&self.name).0
    }

    /// Everything after the first space, empty for single-word names
    pub fn last_name(&self) -> &str {
        split_name(&self.name).1
    }

    /// Returns true if the lead carries a Twitter URL or Discord username
    pub fn has_social_profiles(&self) -> bool {
        self.twitter_url.is_some() || self.discord_username.is_some()
    }
}

/// Splits a display name on its first space
///
/// ```rust
/// use domain_lead::lead::split_name;
///
/// assert_eq!(split_name("Jane Doe"), ("Jane", "Doe"));
/// assert_eq!(split_name("Jean Claude Van Damme"), ("Jean", "Claude Van Damme"));
/// assert_eq!(split_name("Cher"), ("Cher", ""));
/// ```
pub fn split_name(name: &str) -> (&str, &str) {
    let name = name.trim();
    match name.split_once(' ') {
        Some((first, rest)) => (first, rest.trim()),
        None => (name, ""),
    }
}
