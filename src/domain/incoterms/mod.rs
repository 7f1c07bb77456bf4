//! Incoterms 2020 catalog and matching.
//!
//! The catalog is a static, read-only table; nothing here performs I/O.

pub mod catalog;
pub mod matcher;

pub use catalog::{
    DEFAULT_INCOTERM_CODE, Incoterm, TransportMode, ValuationBasis, all_incoterms,
    default_incoterm, incoterm_by_code,
};
pub use matcher::{IncotermSource, ResolvedIncoterm, match_incoterm, resolve_incoterm};
