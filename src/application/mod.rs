//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! the duty-rate interpreter and business rules. Services consume repository
//! traits and provide a clean API for HTTP handlers and the admin tool.
//!
//! # Available Services
//!
//! - [`services::hts_service::HtsService`] - HTS code resolution and bulk import
//! - [`services::duty_service::DutyCalculator`] - Per-item duty calculation
//! - [`services::enrichment_service::EnrichmentService`] - Document enrichment
//! - [`services::document_service::DocumentService`] - Stored documents
//! - [`services::auth_service::AuthService`] - API token authentication

pub mod services;
