//! Request/response data transfer objects

pub mod crm;
pub mod lead;
