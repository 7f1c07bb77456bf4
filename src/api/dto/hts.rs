//! DTOs for HTS endpoints.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::hts_service::DEFAULT_SEARCH_LIMIT;
use crate::domain::entities::HtsDutyRecord;

/// Query for `GET /api/hts/search`.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct HtsSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

impl HtsSearchQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }
}

/// Suggested reference records for a description.
#[derive(Debug, Serialize)]
pub struct HtsSearchResponse {
    pub query: String,
    pub terms: Vec<String>,
    pub count: usize,
    pub results: Vec<HtsDutyRecord>,
}
