//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use domain_lead::{Lead, LeadSubmission, NewLead};

/// Builder for leads, submissions and validated lead input
#[derive(Debug, Clone)]
pub struct TestLeadBuilder {
    name: String,
    email: String,
    phone: Option<String>,
    twitter_url: Option<String>,
    discord_username: Option<String>,
    referred_by: Option<String>,
}

impl Default for TestLeadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLeadBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            twitter_url: None,
            discord_username: None,
            referred_by: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_twitter(mut self, url: impl Into<String>) -> Self {
        self.twitter_url = Some(url.into());
        self
    }

    pub fn with_discord(mut self, username: impl Into<String>) -> Self {
        self.discord_username = Some(username.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referred_by = Some(referrer.into());
        self
    }

    /// Sets both social profile fields
    pub fn with_socials(self) -> Self {
        self.with_twitter("https://twitter.com/jane_plays")
            .with_discord("jane#0001")
    }

    /// Builds the raw form submission
    pub fn build_submission(self) -> LeadSubmission {
        LeadSubmission {
            name: self.name,
            email: self.email,
            phone: self.phone,
            twitter_url: self.twitter_url,
            discord_username: self.discord_username,
            referred_by: self.referred_by,
        }
    }

    /// Builds validated store input, skipping validation
    pub fn build_new(self) -> NewLead {
        NewLead {
            name: self.name,
            email: self.email,
            phone: self.phone,
            twitter_url: self.twitter_url,
            discord_username: self.discord_username,
            referred_by: self.referred_by,
        }
    }

    /// Builds a stored lead with a fresh id
    pub fn build(self) -> Lead {
        Lead::create(self.build_new())
    }
}
