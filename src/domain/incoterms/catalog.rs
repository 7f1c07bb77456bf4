//! The fixed Incoterms 2020 reference table.

use serde::Serialize;

/// Modes of transport an Incoterm may be used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Any,
    Sea,
    Air,
    Land,
}

/// Customs valuation classification attached to each term.
///
/// The `*_LIKE` variants mark multimodal or container terms that value goods
/// the same way as their sea-only counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationBasis {
    Exw,
    FobLike,
    Fob,
    Cfr,
    Cif,
    CfrLike,
    CifLike,
    DapLike,
    DdpComplex,
}

/// An Incoterm with the cost and risk responsibilities it assigns to the seller.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Incoterm {
    pub code: &'static str,
    pub name: &'static str,
    pub description_short: &'static str,
    pub transport_mode: TransportMode,
    pub includes_pre_carriage: bool,
    pub includes_main_carriage: bool,
    pub includes_insurance: bool,
    pub includes_export_clearance: bool,
    pub includes_import_clearance: bool,
    pub includes_duties_taxes: bool,
    pub valuation_basis: ValuationBasis,
    pub risk_transfer_point: &'static str,
    pub notes: &'static str,
}

/// Code of the term assumed when a document states none.
pub const DEFAULT_INCOTERM_CODE: &str = "FOB";

static INCOTERMS: [Incoterm; 11] = [
    Incoterm {
        code: "EXW",
        name: "Ex Works",
        description_short: "Seller makes goods available at their premises; buyer arranges all transport and formalities.",
        transport_mode: TransportMode::Any,
        includes_pre_carriage: false,
        includes_main_carriage: false,
        includes_insurance: false,
        includes_export_clearance: false,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::Exw,
        risk_transfer_point: "Risk transfers at seller premises.",
        notes: "Buyer bears all costs and risks.",
    },
    Incoterm {
        code: "FCA",
        name: "Free Carrier",
        description_short: "Delivery to carrier after export clearance.",
        transport_mode: TransportMode::Any,
        includes_pre_carriage: true,
        includes_main_carriage: false,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::FobLike,
        risk_transfer_point: "Risk transfers to first carrier.",
        notes: "Common for container shipments.",
    },
    Incoterm {
        code: "FAS",
        name: "Free Alongside Ship",
        description_short: "Delivered alongside ship at port.",
        transport_mode: TransportMode::Sea,
        includes_pre_carriage: true,
        includes_main_carriage: false,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::FobLike,
        risk_transfer_point: "Risk transfers at dock.",
        notes: "Sea only, non-containerized freight.",
    },
    Incoterm {
        code: "FOB",
        name: "Free On Board",
        description_short: "Delivered on board vessel.",
        transport_mode: TransportMode::Sea,
        includes_pre_carriage: true,
        includes_main_carriage: false,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::Fob,
        risk_transfer_point: "Risk transfers once on vessel.",
        notes: "Classic export basis.",
    },
    Incoterm {
        code: "CFR",
        name: "Cost and Freight",
        description_short: "Seller pays freight to destination port.",
        transport_mode: TransportMode::Sea,
        includes_pre_carriage: true,
        includes_main_carriage: true,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::Cfr,
        risk_transfer_point: "Risk transfers once on vessel.",
        notes: "Freight included, insurance excluded.",
    },
    Incoterm {
        code: "CIF",
        name: "Cost, Insurance & Freight",
        description_short: "Seller pays freight & insurance to destination port.",
        transport_mode: TransportMode::Sea,
        includes_pre_carriage: true,
        includes_main_carriage: true,
        includes_insurance: true,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::Cif,
        risk_transfer_point: "Risk transfers once on vessel.",
        notes: "Standard valuation basis for sea.",
    },
    Incoterm {
        code: "CPT",
        name: "Carriage Paid To",
        description_short: "Seller pays carriage to destination.",
        transport_mode: TransportMode::Any,
        includes_pre_carriage: true,
        includes_main_carriage: true,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::CfrLike,
        risk_transfer_point: "Risk transfers to first carrier.",
        notes: "Multimodal CFR equivalent.",
    },
    Incoterm {
        code: "CIP",
        name: "Carriage & Insurance Paid To",
        description_short: "Seller pays carriage & insurance.",
        transport_mode: TransportMode::Any,
        includes_pre_carriage: true,
        includes_main_carriage: true,
        includes_insurance: true,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::CifLike,
        risk_transfer_point: "Risk transfers to first carrier.",
        notes: "Multimodal CIF equivalent.",
    },
    Incoterm {
        code: "DAP",
        name: "Delivered At Place",
        description_short: "Delivered ready for unloading.",
        transport_mode: TransportMode::Any,
        includes_pre_carriage: true,
        includes_main_carriage: true,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::DapLike,
        risk_transfer_point: "Risk transfers at named place.",
        notes: "Buyer handles import clearance.",
    },
    Incoterm {
        code: "DPU",
        name: "Delivered at Place Unloaded",
        description_short: "Delivered & unloaded at place.",
        transport_mode: TransportMode::Any,
        includes_pre_carriage: true,
        includes_main_carriage: true,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: false,
        includes_duties_taxes: false,
        valuation_basis: ValuationBasis::DapLike,
        risk_transfer_point: "Risk transfers after unloading.",
        notes: "Only term requiring seller unloading.",
    },
    Incoterm {
        code: "DDP",
        name: "Delivered Duty Paid",
        description_short: "Seller pays all duties & taxes.",
        transport_mode: TransportMode::Any,
        includes_pre_carriage: true,
        includes_main_carriage: true,
        includes_insurance: false,
        includes_export_clearance: true,
        includes_import_clearance: true,
        includes_duties_taxes: true,
        valuation_basis: ValuationBasis::DdpComplex,
        risk_transfer_point: "Risk transfers after import clearance.",
        notes: "Requires stripping duties/taxes for customs value.",
    },
];

/// Returns the full catalog in its canonical order.
pub fn all_incoterms() -> &'static [Incoterm] {
    &INCOTERMS
}

/// Exact, case-insensitive lookup by three-letter code.
pub fn incoterm_by_code(code: &str) -> Option<&'static Incoterm> {
    let code = code.trim();
    INCOTERMS
        .iter()
        .find(|term| term.code.eq_ignore_ascii_case(code))
}

/// The term applied when a document's Incoterm is missing or unrecognized.
pub fn default_incoterm() -> &'static Incoterm {
    // FOB sits at a fixed index in the static table.
    &INCOTERMS[3]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_eleven_unique_codes() {
        let codes: HashSet<_> = all_incoterms().iter().map(|t| t.code).collect();

        assert_eq!(all_incoterms().len(), 11);
        assert_eq!(codes.len(), 11);
    }

    #[test]
    fn test_codes_are_three_uppercase_letters() {
        for term in all_incoterms() {
            assert_eq!(term.code.len(), 3, "{}", term.code);
            assert!(term.code.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_only_ddp_includes_duties() {
        let with_duties: Vec<_> = all_incoterms()
            .iter()
            .filter(|t| t.includes_duties_taxes)
            .map(|t| t.code)
            .collect();

        assert_eq!(with_duties, vec!["DDP"]);
    }

    #[test]
    fn test_default_is_fob() {
        assert_eq!(default_incoterm().code, DEFAULT_INCOTERM_CODE);
        assert_eq!(default_incoterm().valuation_basis, ValuationBasis::Fob);
    }

    #[test]
    fn test_lookup_by_code_ignores_case() {
        assert_eq!(incoterm_by_code("cif").unwrap().name, "Cost, Insurance & Freight");
        assert_eq!(incoterm_by_code(" DdP ").unwrap().code, "DDP");
        assert!(incoterm_by_code("XYZ").is_none());
    }

    #[test]
    fn test_serializes_enums_like_reference_data() {
        let json = serde_json::to_value(incoterm_by_code("CIP").unwrap()).unwrap();

        assert_eq!(json["transport_mode"], "any");
        assert_eq!(json["valuation_basis"], "CIF_LIKE");
    }
}
