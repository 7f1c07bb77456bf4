//! Repository trait for stored trade documents.

use crate::domain::entities::{NewDocument, StoredDocument};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Repository interface for processed documents and their parsed payloads.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgDocumentRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Stores a new processed document with its parsed payload.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, document: NewDocument) -> Result<StoredDocument, AppError>;

    /// Lists the owner's most recent processed documents, newest first.
    ///
    /// Documents without parsed data are not returned.
    async fn latest_processed(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> Result<Vec<StoredDocument>, AppError>;

    /// Replaces the parsed payload of a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if `parsed_id` does not exist.
    async fn save_parsed(&self, parsed_id: i64, parsed_json: Value) -> Result<(), AppError>;
}
