//! Request handlers

pub mod crm;
pub mod health;
pub mod leads;
