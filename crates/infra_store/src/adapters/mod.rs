//! Domain Adapters
//!
//! Adapter implementations for domain ports. Each adapter:
//! - Implements the domain's port trait
//! - Implements `HealthCheckable` for the readiness probe

pub mod lead;

pub use lead::InMemoryLeadRepository;
