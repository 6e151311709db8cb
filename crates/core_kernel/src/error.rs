//! Configuration errors raised while wiring the service together

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A versioned document was written for a format this build cannot read
    #[error("unsupported {document} version {found} (expected {expected})")]
    UnsupportedVersion {
        document: &'static str,
        found: u32,
        expected: u32,
    },

    /// A mapping names fields the remote schema does not have
    #[error("{owner} {document} references unknown fields: {}", .fields.join(", "))]
    UnknownFields {
        owner: String,
        document: &'static str,
        fields: Vec<String>,
    },
}
