//! Port error and health types
//!
//! The lead store and each CRM sit behind a port trait defined in
//! `domain_lead`. Whatever the adapter talks to (a `Vec` behind a lock, the
//! HubSpot REST API, the Close.com REST API) its failures come back as a
//! [`PortError`], so the intake service can log and report them without
//! knowing which adapter produced them.
//!
//! ```text
//!   LeadIntakeService ──► LeadRepository ──► in-memory store
//!          │
//!          └────────────► CrmAdapter ──────► HubSpot / Close.com
//! ```
//!
//! The `Display` output of a `PortError` is what ends up in the `error`
//! field of a failed integration in the submit response.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by every port operation
#[derive(Debug, Error)]
pub enum PortError {
    /// The adapter refused the input or its own configuration
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// No response was received
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// The remote system rejected the credentials
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The remote system answered with a non-success status
    #[error("{service} error ({status}): {message}")]
    Remote {
        service: String,
        status: u16,
        message: String,
    },

    /// A success response that could not be decoded
    #[error("Transformation error: {message}")]
    Transformation { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl PortError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Connection error keeping the transport error as its source
    pub fn connection_caused_by(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PortError::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed: Duration) -> Self {
        PortError::Timeout {
            operation: operation.into(),
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortError::Unauthorized { message: message.into() }
    }

    pub fn remote(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        PortError::Remote {
            service: service.into(),
            status,
            message: message.into(),
        }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Internal error keeping the underlying error as its source
    pub fn internal_caused_by(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PortError::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for failures a later attempt could plausibly get past
    ///
    /// Nothing in the intake path retries; the flag only feeds log fields.
    pub fn is_transient(&self) -> bool {
        match self {
            PortError::Connection { .. } | PortError::Timeout { .. } => true,
            PortError::Remote { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status reported by the remote system, if it answered
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            PortError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Marker for port traits: adapters are shared across request tasks
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Result of probing one adapter, reported by the readiness endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn is_operational(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Adapters that can report their own health
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}
