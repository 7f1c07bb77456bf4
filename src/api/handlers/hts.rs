//! Handlers for HTS code resolution and description search.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde_json::json;

use crate::api::dto::hts::{HtsSearchQuery, HtsSearchResponse};
use crate::domain::entities::HtsDutyRecord;
use crate::error::AppError;
use crate::state::AppState;

/// Resolves a stated HTS code against the reference table.
///
/// # Endpoint
///
/// `GET /api/hts/{code}`
///
/// The code may use any common spelling (`8471.30.0100`, `8471.30.01.00`,
/// `847130`). The response carries the reference rates and the rate selected
/// for duty calculation.
///
/// # Errors
///
/// Returns 404 Not Found if no record matches.
pub async fn hts_lookup_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<HtsDutyRecord>, AppError> {
    state
        .hts_service
        .find_hts_code(&code)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("HTS code not found", json!({ "code": code })))
}

/// Suggests HTS records whose descriptions match a product description.
///
/// `GET /api/hts/search?q=Steel%20shelving%20500%20X%20100MM&limit=5`
///
/// Measurements are ignored; `limit` defaults to 3 and must be between
/// 1 and 20.
///
/// ```json
/// {
///   "query": "Steel shelving 500 X 100MM",
///   "terms": ["steel", "shelving"],
///   "count": 1,
///   "results": [{ "hts_number": "9403.20.00.11", ... }]
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for a blank `q` or an out-of-range `limit`.
pub async fn hts_search_handler(
    State(state): State<AppState>,
    Query(query): Query<HtsSearchQuery>,
) -> Result<Json<HtsSearchResponse>, AppError> {
    let result = state.hts_service.search(&query.q, query.limit()).await?;

    Ok(Json(HtsSearchResponse {
        count: result.records.len(),
        terms: result.terms,
        results: result.records,
        query: query.q,
    }))
}
