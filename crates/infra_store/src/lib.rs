//! Infrastructure Storage Layer
//!
//! This crate provides the storage adapters behind the lead domain's
//! `LeadRepository` port.
//!
//! # Durability
//!
//! The only store is in memory. Leads live as long as the process does and
//! are lost on restart; the CRMs are where leads survive. A durable store
//! would be another adapter in [`adapters`] implementing the same port.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use domain_lead::LeadRepository;
//! use infra_store::InMemoryLeadRepository;
//!
//! let repository: Arc<dyn LeadRepository> = Arc::new(InMemoryLeadRepository::new());
//! ```

pub mod adapters;

pub use adapters::InMemoryLeadRepository;
