//! Business logic services for the application layer.

pub mod auth_service;
pub mod document_service;
pub mod duty_service;
pub mod enrichment_service;
pub mod hts_service;

pub use auth_service::{AuthService, TokenIdentity};
pub use document_service::{DocumentService, ProcessedDocumentView};
pub use duty_service::{DutyCalculator, DutyError};
pub use enrichment_service::{EnrichmentReport, EnrichmentService, EnrichmentStage, SkipReason};
pub use hts_service::HtsService;
