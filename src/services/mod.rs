//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business rules and external calls so route handlers
//! stay focused on request parsing and status mapping.

pub mod billing;
pub mod checkout;
pub mod chef;
pub mod food_facts;
pub mod identity;
pub mod scan;
pub mod usage;
