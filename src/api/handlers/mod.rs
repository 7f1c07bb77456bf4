//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod documents;
pub mod health;
pub mod hts;
pub mod incoterms;

pub use documents::{enrich_document_handler, latest_documents_handler, store_document_handler};
pub use health::health_handler;
pub use hts::{hts_lookup_handler, hts_search_handler};
pub use incoterms::{incoterm_handler, incoterm_list_handler, incoterm_match_handler};
