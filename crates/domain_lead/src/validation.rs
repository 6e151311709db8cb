//! Lead submission validation
//!
//! A [`LeadSubmission`] is the raw form payload. It is normalized (trimmed,
//! blank optionals dropped) and then checked with `validator`:
//!
//! - `name` must be at least 2 characters
//! - `email` must be a syntactically valid address
//!
//! Optional fields are free text and never rejected.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationErrors};

use crate::lead::NewLead;

/// Raw lead form payload
///
/// Missing or `null` `name`/`email` deserialize to empty strings so that they
/// surface as field errors instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub twitter_url: Option<String>,

    #[serde(default)]
    pub discord_username: Option<String>,

    #[serde(default)]
    pub referred_by: Option<String>,
}

impl LeadSubmission {
    /// Creates a submission with only the required fields
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Normalizes and validates the submission
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when `name` or `email` is invalid.
    pub fn into_new_lead(self) -> Result<NewLead, FieldErrors> {
        let normalized = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_blank(self.phone),
            twitter_url: non_blank(self.twitter_url),
            discord_username: non_blank(self.discord_username),
            referred_by: non_blank(self.referred_by),
        };

        normalized.validate().map_err(|e| FieldErrors::from(&e))?;

        Ok(NewLead {
            name: normalized.name,
            email: normalized.email,
            phone: normalized.phone,
            twitter_url: normalized.twitter_url,
            discord_username: normalized.discord_username,
            referred_by: normalized.referred_by,
        })
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Field name to validation messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Adds a message for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Returns true if the field has at least one error
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the fields with errors
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = FieldErrors::default();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_submission() {
        let lead = LeadSubmission::new("Jane Doe", "jane@example.com")
            .into_new_lead()
            .unwrap();
        assert_eq!(lead.name, "Jane Doe");
        assert_eq!(lead.email, "jane@example.com");
    }

    #[test]
    fn test_reports_both_fields() {
        let errors = LeadSubmission::new("A", "not-an-email")
            .into_new_lead()
            .unwrap_err();

        assert!(errors.contains("name"));
        assert!(errors.contains("email"));
        assert_eq!(errors.messages("name"), ["Name must be at least 2 characters"]);
        assert_eq!(errors.messages("email"), ["Please enter a valid email address"]);
    }

    #[test]
    fn test_trims_before_validating() {
        let errors = LeadSubmission::new(" A ", " jane@example.com ")
            .into_new_lead()
            .unwrap_err();
        assert!(errors.contains("name"));
        assert!(!errors.contains("email"));
    }

    #[test]
    fn test_blank_optionals_are_dropped() {
        let submission = LeadSubmission {
            phone: Some("   ".to_string()),
            discord_username: Some(" jane#0001 ".to_string()),
            ..LeadSubmission::new("Jane", "jane@example.com")
        };
        let lead = submission.into_new_lead().unwrap();

        assert_eq!(lead.phone, None);
        assert_eq!(lead.discord_username.as_deref(), Some("jane#0001"));
    }

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let submission: LeadSubmission = serde_json::from_str("{}").unwrap();
        let errors = submission.into_new_lead().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["email", "name"]);
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::default();
        errors.add("name", "too short");
        errors.add("email", "invalid");
        assert_eq!(errors.to_string(), "email: invalid; name: too short");
    }
}
