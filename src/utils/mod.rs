//! Helper functions shared across layers.
//!
//! - [`hts_code`] - HTS code spelling variants and rate column selection
//! - [`json_response`] - Extracting JSON from model answers

pub mod hts_code;
pub mod json_response;
