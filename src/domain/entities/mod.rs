//! Core domain entities.
//!
//! - [`ExtractedDocument`], [`LineItem`], [`ShipmentInfo`] - extracted trade documents
//! - [`HtsRow`], [`HtsDutyRecord`] - tariff reference data
//! - [`DutyCalculationResult`], [`TotalDuties`] - computed duties
//! - [`StoredDocument`], [`NewDocument`] - persisted documents
//!
//! Entities are plain data; behaviour lives in the services
//! (see [`crate::application::services`]).

pub mod document;
pub mod duty;
pub mod hts;
pub mod stored_document;

pub use document::{ExtractedDocument, ExtractedNumber, IncotermDetails, LineItem, ShipmentInfo};
pub use duty::{DutyBreakdownEntry, DutyCalculationEntry, DutyCalculationResult, TotalDuties};
pub use hts::{HtsDutyRecord, HtsRow, HtsSourceEntry, RateType};
pub use stored_document::{DEFAULT_DOCUMENT_TYPE, NewDocument, StoredDocument};
