//! Repository trait for the tariff reference table.

use crate::domain::entities::HtsRow;
use crate::error::AppError;
use async_trait::async_trait;

/// Read access to the HTS reference dataset, plus the bulk loader used by
/// the admin tool.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgHtsRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HtsRepository: Send + Sync {
    /// Finds the row whose HTS number equals `hts_number` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_number(&self, hts_number: &str) -> Result<Option<HtsRow>, AppError>;

    /// Finds the first row (by HTS number) starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<HtsRow>, AppError>;

    /// Finds rows whose description contains every one of `terms`,
    /// case-insensitively, ordered by HTS number.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn search_by_description(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<HtsRow>, AppError>;

    /// Inserts or replaces a batch of rows, keyed by HTS number.
    ///
    /// Returns the number of rows written.
    async fn upsert_batch(&self, rows: Vec<HtsRow>) -> Result<u64, AppError>;

    /// Counts rows in the reference table.
    async fn count(&self) -> Result<i64, AppError>;
}
