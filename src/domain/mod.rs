//! Domain layer containing business entities and logic.
//!
//! Everything here is free of I/O: entities, the Incoterms catalog and
//! matcher, repository contracts and the duty-rate interpreter capability.
//!
//! # Architecture
//!
//! - [`entities`] - Documents, tariff records and duty results
//! - [`incoterms`] - Static Incoterms 2020 catalog and free-text matching
//! - [`interpreter`] - Capability trait for turning rate text into a duty
//! - [`repositories`] - Data access trait definitions
//!
//! Concrete implementations of the traits live in
//! [`crate::infrastructure`]; orchestration lives in
//! [`crate::application::services`].

pub mod entities;
pub mod incoterms;
pub mod interpreter;
pub mod repositories;
