//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for leads and form submissions.
//! These fixtures are designed to be consistent and predictable for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use domain_lead::{Lead, LeadSubmission, NewLead};

/// Fixture for lead test data
pub struct LeadFixtures;

impl LeadFixtures {
    /// A lead with only the required fields
    pub fn jane_doe() -> NewLead {
        NewLead::new("Jane Doe", "jane@example.com")
    }

    /// A lead with every optional field filled in
    pub fn full_profile() -> NewLead {
        NewLead {
            name: "Kai Nakamura".to_string(),
            email: "kai@guildhall.gg".to_string(),
            phone: Some("+1 415 555 0134".to_string()),
            twitter_url: Some("https://twitter.com/kai_builds".to_string()),
            discord_username: Some("kai#4242".to_string()),
            referred_by: Some("GDC 2024".to_string()),
        }
    }

    /// A stored version of [`LeadFixtures::full_profile`]
    pub fn stored_full_profile() -> Lead {
        Lead::create(Self::full_profile())
    }
}

/// Fixture for raw form submissions
pub struct SubmissionFixtures;

impl SubmissionFixtures {
    /// A submission that passes validation
    pub fn valid() -> LeadSubmission {
        LeadSubmission::new("Jane Doe", "jane@example.com")
    }

    /// A submission failing both the name and email rules
    pub fn invalid() -> LeadSubmission {
        LeadSubmission::new("J", "not-an-email")
    }

    /// Form payload as the landing page sends it
    pub fn json_body() -> serde_json::Value {
        serde_json::json!({
            "name": "Kai Nakamura",
            "email": "kai@guildhall.gg",
            "phone": "+1 415 555 0134",
            "twitterUrl": "https://twitter.com/kai_builds",
            "discordUsername": "kai#4242",
            "referredBy": ""
        })
    }
}

/// Fixture for fixed timestamps
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Jan 15, 2024 09:30 UTC
    pub fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }
}
