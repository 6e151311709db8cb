//! Core Kernel - types shared by every lead intake crate
//!
//! - [`LeadId`], the local lead identifier
//! - [`PortError`] and the health check types used at adapter seams
//! - [`CoreError`] for configuration problems found while starting up

pub mod identifiers;
pub mod ports;
pub mod error;

pub use identifiers::LeadId;
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
pub use error::CoreError;
