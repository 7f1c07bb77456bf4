//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`reasoning`] - duty-rate interpreter backends

pub mod persistence;
pub mod reasoning;
