//! Stored document retrieval and persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::enrichment_service::{EnrichmentReport, EnrichmentService};
use crate::domain::entities::{ExtractedDocument, NewDocument, StoredDocument};
use crate::domain::repositories::{DocumentRepository, HtsRepository};
use crate::error::AppError;

/// Extraction method recorded when a caller does not name one.
pub const DEFAULT_EXTRACTION_METHOD: &str = "gemini_vision";

/// Largest number of documents returned by one listing.
pub const MAX_LATEST_LIMIT: i64 = 50;

/// A processed document as returned to API clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocumentView {
    pub document_id: i64,
    pub file_name: String,
    pub document_type: String,
    /// Enriched data, or the stored payload as-is if it could not be read
    /// as a document.
    pub extracted_data: Value,
    /// Extraction confidence as a fraction (0-1).
    pub confidence: f64,
    pub extraction_method: String,
    pub created_at: DateTime<Utc>,
    /// HTS codes recorded when the document was stored.
    pub stored_hts_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_hts_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
}

/// Service for storing extracted documents and serving them enriched.
pub struct DocumentService<D: DocumentRepository + ?Sized, H: HtsRepository + ?Sized> {
    repository: Arc<D>,
    enrichment: Arc<EnrichmentService<H>>,
}

impl<D: DocumentRepository + ?Sized, H: HtsRepository + ?Sized> DocumentService<D, H> {
    pub fn new(repository: Arc<D>, enrichment: Arc<EnrichmentService<H>>) -> Self {
        Self {
            repository,
            enrichment,
        }
    }

    /// Stores a newly extracted document for `new_document.owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn store(&self, new_document: NewDocument) -> Result<StoredDocument, AppError> {
        let stored = self.repository.insert(new_document).await?;

        tracing::info!(
            document_id = stored.id,
            owner = %stored.owner_id,
            file_name = %stored.file_name,
            "Document stored"
        );

        Ok(stored)
    }

    /// Loads the owner's latest processed documents and enriches each.
    ///
    /// Enriched payloads are written back so later reads skip duty work.
    /// A failed write-back is logged and the enriched view is still
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `limit` is outside `1..=50`.
    ///
    /// Returns [`AppError::Internal`] if documents cannot be loaded.
    pub async fn latest_enriched(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> Result<Vec<ProcessedDocumentView>, AppError> {
        if !(1..=MAX_LATEST_LIMIT).contains(&limit) {
            return Err(AppError::bad_request(
                "Limit must be between 1 and 50",
                json!({ "limit": limit }),
            ));
        }

        let documents = self.repository.latest_processed(owner_id, limit).await?;
        let mut views = Vec::with_capacity(documents.len());

        for stored in documents {
            views.push(self.enrich_stored(stored).await?);
        }

        Ok(views)
    }

    async fn enrich_stored(&self, stored: StoredDocument) -> Result<ProcessedDocumentView, AppError> {
        let original = stored.extracted_value().clone();

        let (extracted_data, enrichment) =
            match serde_json::from_value::<ExtractedDocument>(original.clone()) {
                Ok(mut document) => {
                    let report = self.enrichment.enrich(&mut document).await?;
                    let enriched = serde_json::to_value(&document).map_err(|e| {
                        AppError::internal(
                            "Failed to serialize document",
                            json!({ "reason": e.to_string() }),
                        )
                    })?;

                    if enriched != original {
                        self.write_back(&stored, &document).await;
                    }

                    (enriched, Some(report))
                }
                Err(e) => {
                    tracing::warn!(
                        document_id = stored.id,
                        error = %e,
                        "Stored payload is not a readable document, returning it unenriched"
                    );
                    (original, None)
                }
            };

        Ok(ProcessedDocumentView {
            document_id: stored.id,
            file_name: stored.file_name.clone(),
            document_type: stored.document_type(),
            extracted_data,
            confidence: stored.extraction_confidence.unwrap_or(0.0) / 100.0,
            extraction_method: stored
                .extraction_method
                .clone()
                .unwrap_or_else(|| DEFAULT_EXTRACTION_METHOD.to_string()),
            created_at: stored.created_at,
            stored_hts_codes: stored.hts_codes.clone(),
            primary_hts_code: stored.primary_hts_code.clone(),
            enrichment,
        })
    }

    async fn write_back(&self, stored: &StoredDocument, document: &ExtractedDocument) {
        let payload = match stored.with_extracted(document) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(document_id = stored.id, error = %e, "Failed to build enriched payload");
                return;
            }
        };

        if let Err(e) = self.repository.save_parsed(stored.parsed_id, payload).await {
            tracing::warn!(document_id = stored.id, error = %e, "Failed to persist enriched document");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{DutyCalculator, HtsService};
    use crate::domain::entities::HtsRow;
    use crate::domain::interpreter::MockDutyRateInterpreter;
    use crate::domain::repositories::{MockDocumentRepository, MockHtsRepository};
    use std::time::Duration;

    fn enrichment() -> Arc<EnrichmentService<MockHtsRepository>> {
        let mut hts = MockHtsRepository::new();
        hts.expect_find_by_number().returning(|code| {
            Ok(Some(HtsRow {
                hts_number: code.to_string(),
                description: "Reference line".to_string(),
                general_rate_of_duty: Some("5%".to_string()),
                special_rate_of_duty: None,
                column_2_rate_of_duty: None,
                unit_of_quantity: vec![],
                additional_duties: None,
            }))
        });
        let mut interpreter = MockDutyRateInterpreter::new();
        interpreter.expect_name().return_const("mock");
        interpreter
            .expect_interpret()
            .returning(|_| Ok(r#"{"calculatedDuty": 50, "currency": "USD"}"#.to_string()));

        Arc::new(EnrichmentService::new(
            Arc::new(HtsService::new(Arc::new(hts))),
            Arc::new(DutyCalculator::new(
                Arc::new(interpreter),
                Duration::from_secs(5),
            )),
            4,
        ))
    }

    fn stored(parsed_json: Value) -> StoredDocument {
        StoredDocument {
            id: 3,
            owner_id: "ops".to_string(),
            file_name: "invoice.pdf".to_string(),
            status: "processed".to_string(),
            created_at: Utc::now(),
            parsed_id: 30,
            parsed_json,
            extraction_confidence: Some(87.0),
            extraction_method: None,
            hts_codes: vec!["6109.10.0012".to_string()],
            primary_hts_code: Some("6109.10.0012".to_string()),
        }
    }

    #[tokio::test]
    async fn test_latest_enriched_writes_back_nested_payload() {
        let mut repo = MockDocumentRepository::new();
        repo.expect_latest_processed()
            .withf(|owner, limit| owner == "ops" && *limit == 1)
            .returning(|_, _| {
                Ok(vec![stored(json!({
                    "documentType": "commercial_invoice",
                    "extractedData": {
                        "shipmentInfo": { "incoterms": "FOB Shanghai" },
                        "products": [{ "description": "Widget", "totalPrice": 1000, "htsCode": "8479.89.9499" }]
                    }
                }))])
            });
        repo.expect_save_parsed()
            .withf(|parsed_id, payload| {
                *parsed_id == 30
                    && payload["documentType"] == "commercial_invoice"
                    && payload["extractedData"]["totalDuties"]["amount"] == 50.0
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = DocumentService::new(Arc::new(repo), enrichment());

        let views = service.latest_enriched("ops", 1).await.unwrap();

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.document_id, 3);
        assert_eq!(view.confidence, 0.87);
        assert_eq!(view.extraction_method, DEFAULT_EXTRACTION_METHOD);
        assert_eq!(view.extracted_data["shipmentInfo"]["incoterm"], "FOB");
        assert_eq!(view.extracted_data["products"][0]["dutyCalculation"]["calculatedDuty"], 50.0);
        assert_eq!(view.stored_hts_codes, vec!["6109.10.0012"]);

        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["storedHtsCodes"][0], "6109.10.0012");
        assert_eq!(json["primaryHtsCode"], "6109.10.0012");
    }

    #[tokio::test]
    async fn test_unchanged_document_is_not_written() {
        let mut repo = MockDocumentRepository::new();
        repo.expect_latest_processed().returning(|_, _| {
            Ok(vec![stored(json!({
                "shipmentInfo": {
                    "incoterms": "DDP",
                    "incoterm": "DDP",
                    "incotermDetails": serde_json::to_value(
                        crate::domain::entities::IncotermDetails::from(
                            crate::domain::incoterms::incoterm_by_code("DDP").unwrap()
                        )
                    ).unwrap()
                },
                "products": []
            }))])
        });
        repo.expect_save_parsed().never();

        let service = DocumentService::new(Arc::new(repo), enrichment());

        let views = service.latest_enriched("ops", 5).await.unwrap();

        assert_eq!(views[0].extracted_data["shipmentInfo"]["incoterm"], "DDP");
    }

    #[tokio::test]
    async fn test_write_back_failure_still_returns_view() {
        let mut repo = MockDocumentRepository::new();
        repo.expect_latest_processed().returning(|_, _| {
            Ok(vec![stored(json!({ "shipmentInfo": {}, "products": [] }))])
        });
        repo.expect_save_parsed()
            .returning(|_, _| Err(AppError::internal("Database error", json!({}))));

        let service = DocumentService::new(Arc::new(repo), enrichment());

        let views = service.latest_enriched("ops", 5).await.unwrap();

        assert_eq!(views[0].extracted_data["shipmentInfo"]["incoterm"], "FOB");
    }

    #[tokio::test]
    async fn test_limit_is_validated() {
        let repo = MockDocumentRepository::new();
        let service = DocumentService::new(Arc::new(repo), enrichment());

        let err = service.latest_enriched("ops", 0).await.unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }
}
