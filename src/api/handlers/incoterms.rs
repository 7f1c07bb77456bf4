//! Handlers for the Incoterm catalog.

use axum::Json;
use axum::extract::{Path, Query};
use serde_json::json;

use crate::api::dto::incoterms::{IncotermMatchQuery, IncotermMatchResponse};
use crate::domain::incoterms::{
    Incoterm, all_incoterms, incoterm_by_code, match_incoterm, resolve_incoterm,
};
use crate::error::AppError;

/// Lists all eleven Incoterms 2020 in catalog order.
///
/// `GET /api/incoterms`
pub async fn incoterm_list_handler() -> Json<&'static [Incoterm]> {
    Json(all_incoterms())
}

/// Looks up one term by its three-letter code, case-insensitively.
///
/// `GET /api/incoterms/{code}`
///
/// # Errors
///
/// Returns 404 Not Found for unknown codes.
pub async fn incoterm_handler(Path(code): Path<String>) -> Result<Json<&'static Incoterm>, AppError> {
    incoterm_by_code(&code)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Incoterm not found", json!({ "code": code })))
}

/// Matches free text the way document enrichment does.
///
/// `GET /api/incoterms/match?q=FOB%20Shanghai`
///
/// ```json
/// {
///   "query": "FOB Shanghai",
///   "matched": { "code": "FOB", ... },
///   "resolved": { "code": "FOB", ... },
///   "source": "matched"
/// }
/// ```
pub async fn incoterm_match_handler(
    Query(params): Query<IncotermMatchQuery>,
) -> Json<IncotermMatchResponse> {
    let query = params.q.as_deref();
    let resolved = resolve_incoterm(query);

    Json(IncotermMatchResponse {
        matched: match_incoterm(query),
        resolved: resolved.incoterm,
        source: resolved.source,
        query: params.q,
    })
}
