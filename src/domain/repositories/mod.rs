//! Repository trait definitions for the domain layer.
//!
//! Traits describe the data the core needs; concrete implementations live in
//! `crate::infrastructure::persistence`. Mocks are generated with `mockall`
//! for unit tests.
//!
//! - [`HtsRepository`] - tariff reference lookups and bulk import
//! - [`DocumentRepository`] - processed documents and parsed payloads
//! - [`TokenRepository`] - API token authentication

pub mod document_repository;
pub mod hts_repository;
pub mod token_repository;

pub use document_repository::DocumentRepository;
pub use hts_repository::HtsRepository;
pub use token_repository::{ApiToken, TokenRepository};

#[cfg(test)]
pub use document_repository::MockDocumentRepository;
#[cfg(test)]
pub use hts_repository::MockHtsRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
