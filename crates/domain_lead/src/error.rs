//! Lead domain errors
//!
//! Only two failures are visible to callers of the intake service: the
//! submission was invalid, or the lead store rejected the write. CRM failures
//! never surface here; they are reported per provider in the intake receipt.

use thiserror::Error;

use core_kernel::PortError;

use crate::validation::FieldErrors;

/// Errors that can occur in the lead domain
#[derive(Debug, Error)]
pub enum LeadError {
    /// The submission failed validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// The lead store could not complete the operation
    #[error("Lead store error: {0}")]
    Storage(#[source] PortError),
}

impl LeadError {
    /// Returns the field errors if this is a validation failure
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            LeadError::Validation(errors) => Some(errors),
            LeadError::Storage(_) => None,
        }
    }
}

impl From<FieldErrors> for LeadError {
    fn from(errors: FieldErrors) -> Self {
        LeadError::Validation(errors)
    }
}
