//! Handlers for document enrichment and storage.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::json;
use validator::Validate;

use crate::api::dto::documents::{
    EnrichResponse, LatestDocumentsQuery, LatestDocumentsResponse, MAX_LINE_ITEMS,
    StoreDocumentRequest, StoredDocumentResponse,
};
use crate::application::services::TokenIdentity;
use crate::domain::entities::ExtractedDocument;
use crate::error::AppError;
use crate::state::AppState;

fn check_line_items(document: &ExtractedDocument) -> Result<(), AppError> {
    if document.products.len() > MAX_LINE_ITEMS {
        return Err(AppError::bad_request(
            "Too many line items",
            json!({ "max": MAX_LINE_ITEMS, "got": document.products.len() }),
        ));
    }
    Ok(())
}

/// Enriches a posted document without storing it.
///
/// # Endpoint
///
/// `POST /api/documents/enrich`
///
/// # Request Body
///
/// An extracted document:
///
/// ```json
/// {
///   "shipmentInfo": { "incoterms": "CIF Rotterdam", "originCountry": "CN" },
///   "products": [
///     { "description": "Laptop", "quantity": 10, "unitPrice": 800, "htsCode": "8471.30.0100" }
///   ]
/// }
/// ```
///
/// # Response
///
/// The enriched document under `extractedData` and what the pass did under
/// `report`. Per-item duty failures show up in the report, not as errors.
///
/// # Errors
///
/// Returns 400 Bad Request for more than [`MAX_LINE_ITEMS`] items.
pub async fn enrich_document_handler(
    State(state): State<AppState>,
    Json(mut document): Json<ExtractedDocument>,
) -> Result<Json<EnrichResponse>, AppError> {
    check_line_items(&document)?;

    let report = state.enrichment_service.enrich(&mut document).await?;

    Ok(Json(EnrichResponse {
        extracted_data: document,
        report,
    }))
}

/// Stores an extracted document for the calling token.
///
/// # Endpoint
///
/// `POST /api/documents`
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
pub async fn store_document_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<TokenIdentity>,
    Json(payload): Json<StoreDocumentRequest>,
) -> Result<(StatusCode, Json<StoredDocumentResponse>), AppError> {
    payload.validate()?;
    check_line_items(&payload.extracted_data)?;

    let stored = state
        .document_service
        .store(payload.into_new_document(identity.owner_id()))
        .await?;

    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// Returns the caller's latest processed documents, enriched.
///
/// # Endpoint
///
/// `GET /api/documents/latest?limit=5`
///
/// `limit` defaults to 1 and must be between 1 and 50.
pub async fn latest_documents_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<TokenIdentity>,
    Query(query): Query<LatestDocumentsQuery>,
) -> Result<Json<LatestDocumentsResponse>, AppError> {
    let documents = state
        .document_service
        .latest_enriched(identity.owner_id(), query.limit())
        .await?;

    Ok(Json(LatestDocumentsResponse {
        count: documents.len(),
        documents,
    }))
}
