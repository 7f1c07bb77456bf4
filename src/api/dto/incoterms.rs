//! DTOs for Incoterm catalog endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::incoterms::{Incoterm, IncotermSource};

/// Query for `GET /api/incoterms/match`.
#[derive(Debug, Deserialize)]
pub struct IncotermMatchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Result of matching free text against the catalog.
///
/// `matched` is the raw matcher output; `resolved` applies the default
/// policy and is always present.
#[derive(Debug, Serialize)]
pub struct IncotermMatchResponse {
    pub query: Option<String>,
    pub matched: Option<&'static Incoterm>,
    pub resolved: &'static Incoterm,
    pub source: IncotermSource,
}
