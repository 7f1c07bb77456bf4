//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    enrich_document_handler, hts_lookup_handler, hts_search_handler, incoterm_handler,
    incoterm_list_handler, incoterm_match_handler, latest_documents_handler,
    store_document_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET  /incoterms`          - Full Incoterms 2020 catalog
/// - `GET  /incoterms/match`    - Match free text (`?q=`) to a term
/// - `GET  /incoterms/{code}`   - Single term by code
/// - `GET  /hts/search`         - Suggest HTS records for a description (`?q=`)
/// - `GET  /hts/{code}`         - Resolve an HTS code
/// - `POST /documents`          - Store an extracted document
/// - `POST /documents/enrich`   - Enrich a document without storing it
/// - `GET  /documents/latest`   - Caller's latest documents, enriched
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/incoterms", get(incoterm_list_handler))
        .route("/incoterms/match", get(incoterm_match_handler))
        .route("/incoterms/{code}", get(incoterm_handler))
        .route("/hts/search", get(hts_search_handler))
        .route("/hts/{code}", get(hts_lookup_handler))
        .route("/documents", post(store_document_handler))
        .route("/documents/enrich", post(enrich_document_handler))
        .route("/documents/latest", get(latest_documents_handler))
}
