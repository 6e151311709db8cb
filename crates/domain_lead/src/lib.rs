//! Lead Intake Domain
//!
//! This crate owns everything a landing-page lead goes through after the
//! visitor presses submit: validation, the local store port, and the
//! best-effort fan-out to the HubSpot and Close.com CRMs.
//!
//! # Fan-out Model
//!
//! The local store is the system of record. CRMs receive copies:
//!
//! - A lead is accepted once it is validated and stored
//! - Each configured CRM is then called once, in provider order
//! - CRM failures are reported per provider and never undo the store write
//!
//! There are no retries. A CRM that was down during a submission simply
//! never hears about that lead.
//!
//! # Examples
//!
//! ```rust
//! use domain_lead::{LeadSubmission, NewLead};
//!
//! let submission = LeadSubmission {
//!     phone: Some("   ".to_string()),
//!     ..LeadSubmission::new(" Jane Doe ", "jane@example.com")
//! };
//!
//! let lead: NewLead = submission.into_new_lead().unwrap();
//! assert_eq!(lead.name, "Jane Doe");
//! assert_eq!(lead.phone, None);
//!
//! let errors = LeadSubmission::new("J", "not-an-email").into_new_lead().unwrap_err();
//! assert!(errors.contains("name"));
//! assert!(errors.contains("email"));
//! ```

pub mod lead;
pub mod error;
pub mod validation;
pub mod field_mapping;
pub mod ports;
pub mod adapters;
pub mod services;

pub use lead::{Lead, NewLead};
pub use error::LeadError;
pub use validation::{FieldErrors, LeadSubmission};
pub use field_mapping::{FieldMapping, ProviderFields, SocialField};
pub use ports::{CrmAdapter, CrmProvider, LeadRepository, UpsertOutcome};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockBehaviour, MockCrmAdapter, MockLeadRepository};
pub use adapters::{
    CloseAdapter, CloseConfig, ContactLookup, CrmRegistry, CrmSettings, HubSpotAdapter,
    HubSpotConfig,
};
pub use services::{
    AdapterResult, IntakeReceipt, IntegrationOutcome, LeadIntakeService, DEFAULT_ADAPTER_TIMEOUT,
};
