//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants, plus `fake`-backed one-off values.

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use proptest::prelude::*;

use domain_lead::{LeadSubmission, NewLead};

/// Strategy for display names that pass validation
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,8}( [A-Z][a-z]{1,10}){0,2}"
}

/// Strategy for syntactically valid email addresses
pub fn email_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{2,9}@[a-z]{3,8}\\.(com|io|gg|org)"
}

/// Strategy for strings that are not email addresses
pub fn invalid_email_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{3,10}",
        "[a-z]{3,10}@",
        "@[a-z]{3,10}\\.com",
        "[a-z]{2,5} [a-z]{2,5}@[a-z]{3,5}\\.com",
    ]
}

/// Strategy for optional free-text fields without surrounding whitespace
pub fn optional_text_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-zA-Z0-9_#./:]{1,24}")
}

/// Strategy for validated lead input
pub fn new_lead_strategy() -> impl Strategy<Value = NewLead> {
    (
        name_strategy(),
        email_strategy(),
        optional_text_strategy(),
        optional_text_strategy(),
        optional_text_strategy(),
        optional_text_strategy(),
    )
        .prop_map(|(name, email, phone, twitter_url, discord_username, referred_by)| NewLead {
            name,
            email,
            phone,
            twitter_url,
            discord_username,
            referred_by,
        })
}

/// Strategy for submissions that pass validation
pub fn valid_submission_strategy() -> impl Strategy<Value = LeadSubmission> {
    new_lead_strategy().prop_map(|lead| LeadSubmission {
        name: lead.name,
        email: lead.email,
        phone: lead.phone,
        twitter_url: lead.twitter_url,
        discord_username: lead.discord_username,
        referred_by: lead.referred_by,
    })
}

/// A random but realistic submission
pub fn fake_submission() -> LeadSubmission {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    LeadSubmission::new(name, email)
}
