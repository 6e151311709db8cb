//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! lead intake test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for leads and submissions
//! - `builders`: Builder patterns for test data construction
//! - `fake_crm`: In-process HubSpot and Close.com servers for adapter tests
//! - `assertions`: Custom assertion helpers for intake receipts
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod fake_crm;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use fake_crm::*;
pub use assertions::*;
pub use generators::*;
