//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for intake results that give
//! more meaningful error messages than standard assertions.

use domain_lead::{AdapterResult, CrmProvider, FieldErrors, IntakeReceipt};

/// Asserts that a provider synced and returns its remote id
///
/// # Panics
///
/// Panics if the provider was skipped or failed, or if `is_new` differs.
pub fn assert_synced(receipt: &IntakeReceipt, provider: CrmProvider, expected_new: bool) -> String {
    match receipt.outcome(provider) {
        AdapterResult::Synced { remote_id, is_new } => {
            assert_eq!(
                *is_new, expected_new,
                "{} synced but is_new={}, expected {}",
                provider, is_new, expected_new
            );
            remote_id.clone()
        }
        other => panic!("Expected {} to sync, got {:?}", provider, other),
    }
}

/// Asserts that a provider failed and returns the reason
pub fn assert_failed(receipt: &IntakeReceipt, provider: CrmProvider) -> String {
    match receipt.outcome(provider) {
        AdapterResult::Failed { reason } => reason.clone(),
        other => panic!("Expected {} to fail, got {:?}", provider, other),
    }
}

/// Asserts that a provider was never called
pub fn assert_skipped(receipt: &IntakeReceipt, provider: CrmProvider) {
    assert_eq!(
        receipt.outcome(provider),
        &AdapterResult::Skipped,
        "Expected {} to be skipped",
        provider
    );
}

/// Asserts that a field carries the given validation message
pub fn assert_field_error(errors: &FieldErrors, field: &str, message: &str) {
    assert!(
        errors.messages(field).iter().any(|m| m == message),
        "Expected field '{}' to have error '{}', got {:?}",
        field,
        message,
        errors.messages(field)
    );
}
