//! DTOs for document endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::application::services::document_service::DEFAULT_EXTRACTION_METHOD;
use crate::application::services::{EnrichmentReport, ProcessedDocumentView};
use crate::domain::entities::{DEFAULT_DOCUMENT_TYPE, ExtractedDocument, NewDocument, StoredDocument};

/// Largest number of line items accepted in one request.
pub const MAX_LINE_ITEMS: usize = 500;

/// Response of `POST /api/documents/enrich`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichResponse {
    pub extracted_data: ExtractedDocument,
    pub report: EnrichmentReport,
}

/// Request to store an extracted document.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocumentRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,

    #[validate(length(max = 100))]
    pub file_type: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub document_type: Option<String>,

    /// Percentage, 0-100.
    #[validate(range(min = 0.0, max = 100.0))]
    pub extraction_confidence: Option<f64>,

    #[validate(length(min = 1, max = 64))]
    pub extraction_method: Option<String>,

    /// Codes to record with the document; taken from the line items when absent.
    #[validate(length(max = 500))]
    pub hts_codes: Option<Vec<String>>,

    #[validate(length(min = 1, max = 32))]
    pub primary_hts_code: Option<String>,

    pub extracted_data: ExtractedDocument,
}

impl StoreDocumentRequest {
    /// Builds the record to insert for `owner_id`.
    pub fn into_new_document(self, owner_id: &str) -> NewDocument {
        let hts_codes: Vec<String> = match self.hts_codes {
            Some(codes) => codes
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            None => self.extracted_data.classified_hts_codes(),
        };
        let primary_hts_code = self
            .primary_hts_code
            .or_else(|| hts_codes.first().cloned());

        NewDocument {
            owner_id: owner_id.to_string(),
            file_name: self.file_name,
            file_type: self.file_type,
            document_type: self
                .document_type
                .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
            extracted: self.extracted_data,
            extraction_confidence: self.extraction_confidence,
            extraction_method: self
                .extraction_method
                .unwrap_or_else(|| DEFAULT_EXTRACTION_METHOD.to_string()),
            hts_codes,
            primary_hts_code,
        }
    }
}

/// Response of `POST /api/documents`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocumentResponse {
    pub document_id: i64,
    pub file_name: String,
    pub document_type: String,
    pub status: String,
    pub hts_codes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<StoredDocument> for StoredDocumentResponse {
    fn from(stored: StoredDocument) -> Self {
        Self {
            document_type: stored.document_type(),
            document_id: stored.id,
            file_name: stored.file_name,
            status: stored.status,
            hts_codes: stored.hts_codes,
            created_at: stored.created_at,
        }
    }
}

/// Query for `GET /api/documents/latest`.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LatestDocumentsQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

impl LatestDocumentsQuery {
    /// Requested limit, defaulting to the single newest document.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(1)
    }
}

/// Response of `GET /api/documents/latest`.
#[derive(Debug, Serialize)]
pub struct LatestDocumentsResponse {
    pub count: usize,
    pub documents: Vec<ProcessedDocumentView>,
}
