//! HTS code resolution against the tariff reference table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{HtsDutyRecord, HtsRow};
use crate::domain::repositories::HtsRepository;
use crate::error::AppError;
use crate::utils::hts_code::{candidate_formats, heading_prefix, search_terms, select_rate};
use serde_json::json;

/// Rows written per upsert during bulk import.
pub const IMPORT_BATCH_SIZE: usize = 1000;

/// Results returned by a description search when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: i64 = 3;

/// Largest limit a description search accepts.
pub const MAX_SEARCH_LIMIT: i64 = 20;

/// Outcome of a description search.
#[derive(Debug)]
pub struct HtsSearchResult {
    pub terms: Vec<String>,
    pub records: Vec<HtsDutyRecord>,
}

/// Service resolving stated HTS codes to reference records.
///
/// Lookups are never cached; every call queries the repository.
pub struct HtsService<R: HtsRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: HtsRepository + ?Sized> HtsService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Resolves a stated HTS code, tolerating format differences.
    ///
    /// Every spelling from [`candidate_formats`] is tried as an exact match,
    /// then the `heading.subheading` prefix of the first spelling. The
    /// returned record carries the rate selected by [`select_rate`].
    ///
    /// Returns `Ok(None)` for blank input or when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the reference store fails.
    pub async fn find_hts_code(&self, code: &str) -> Result<Option<HtsDutyRecord>, AppError> {
        let candidates = candidate_formats(code);
        let Some(first) = candidates.first() else {
            return Ok(None);
        };

        tracing::debug!(code, ?candidates, "Resolving HTS code");

        for candidate in &candidates {
            if let Some(row) = self.repository.find_by_number(candidate).await? {
                tracing::debug!(code, matched = %row.hts_number, "HTS code matched exactly");
                return Ok(Some(self.to_record(row, "exact")));
            }
        }

        if let Some(prefix) = heading_prefix(first) {
            if let Some(row) = self.repository.find_by_prefix(&prefix).await? {
                tracing::debug!(code, prefix = %prefix, matched = %row.hts_number, "HTS code matched by heading");
                return Ok(Some(self.to_record(row, "prefix")));
            }
        }

        tracing::debug!(code, "No HTS reference record found");
        metrics::counter!("hts_lookups_total", "result" => "miss").increment(1);

        Ok(None)
    }

    /// Suggests reference records for a product description.
    ///
    /// The description is reduced with [`search_terms`] and every term must
    /// appear in a record's description. Records come back ordered by HTS
    /// number, each with its selected rate.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a blank description or a limit
    /// outside `1..=20`.
    ///
    /// Returns [`AppError::Internal`] if the reference store fails.
    pub async fn search(&self, description: &str, limit: i64) -> Result<HtsSearchResult, AppError> {
        if description.trim().is_empty() {
            return Err(AppError::bad_request(
                "Description is required",
                json!({ "field": "q" }),
            ));
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(AppError::bad_request(
                "Limit must be between 1 and 20",
                json!({ "limit": limit }),
            ));
        }

        let terms = search_terms(description);
        let rows = self.repository.search_by_description(&terms, limit).await?;

        tracing::debug!(?terms, found = rows.len(), "Searched HTS descriptions");

        let records = rows
            .into_iter()
            .map(|row| {
                let selected = select_rate(&row);
                HtsDutyRecord::from_row(row, selected)
            })
            .collect();

        Ok(HtsSearchResult { terms, records })
    }

    fn to_record(&self, row: HtsRow, how: &'static str) -> HtsDutyRecord {
        metrics::counter!("hts_lookups_total", "result" => how).increment(1);
        let selected = select_rate(&row);
        HtsDutyRecord::from_row(row, selected)
    }

    /// Loads reference rows in batches of [`IMPORT_BATCH_SIZE`].
    ///
    /// Rows without an HTS number are skipped; when a number repeats, the
    /// last row wins. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns the first repository error; earlier batches stay written.
    pub async fn import(&self, rows: Vec<HtsRow>) -> Result<u64, AppError> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut unique: Vec<HtsRow> = Vec::with_capacity(rows.len());
        for row in rows {
            if row.hts_number.trim().is_empty() {
                continue;
            }
            match positions.get(&row.hts_number) {
                Some(&at) => unique[at] = row,
                None => {
                    positions.insert(row.hts_number.clone(), unique.len());
                    unique.push(row);
                }
            }
        }
        let rows = unique;
        let total_batches = rows.len().div_ceil(IMPORT_BATCH_SIZE);
        let mut written = 0;

        for (index, batch) in rows.chunks(IMPORT_BATCH_SIZE).enumerate() {
            written += self.repository.upsert_batch(batch.to_vec()).await?;
            tracing::info!(
                batch = index + 1,
                total_batches,
                written,
                "Imported HTS batch"
            );
        }

        Ok(written)
    }

    /// Number of rows in the reference table.
    pub async fn count(&self) -> Result<i64, AppError> {
        self.repository.count().await
    }
}
