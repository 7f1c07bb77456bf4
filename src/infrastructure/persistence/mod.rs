//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs. The schema lives in
//! `migrations/` and is applied at startup.
//!
//! # Repositories
//!
//! - [`PgHtsRepository`] - Tariff reference lookups and bulk import
//! - [`PgDocumentRepository`] - Processed documents and parsed payloads
//! - [`PgTokenRepository`] - API token storage and validation

pub mod pg_document_repository;
pub mod pg_hts_repository;
pub mod pg_token_repository;

pub use pg_document_repository::PgDocumentRepository;
pub use pg_hts_repository::PgHtsRepository;
pub use pg_token_repository::PgTokenRepository;
