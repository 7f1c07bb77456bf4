//! Structured trade documents produced by upstream AI extraction.
//!
//! Extraction output is loosely shaped: numbers arrive as strings, fields
//! arrive as `null`, keys the service does not know about must survive a
//! round-trip. Every struct keeps unknown keys in an `extra` map, and numeric
//! fields are held verbatim as [`ExtractedNumber`] so a value that does not
//! read as a number is written back unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::duty::{DutyCalculationEntry, DutyCalculationResult, TotalDuties};
use crate::domain::incoterms::Incoterm;

/// An extracted commercial invoice or packing list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub shipment_info: ShipmentInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duties: Option<TotalDuties>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub duty_calculations: Vec<DutyCalculationEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtractedDocument {
    /// Whether a previous pass already produced a duty total.
    pub fn has_total_duties(&self) -> bool {
        self.total_duties
            .as_ref()
            .is_some_and(TotalDuties::is_calculated)
    }

    /// Distinct non-blank HTS codes of the line items, in line order.
    pub fn classified_hts_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for code in self.products.iter().filter_map(LineItem::classified_hts_code) {
            if !codes.iter().any(|c| c == code) {
                codes.push(code.to_string());
            }
        }
        codes
    }
}

/// Shipment-level facts, including the stated trade term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInfo {
    /// Trade term as extracted; some extractions use the singular key instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoterms: Option<String>,
    /// Canonical code, written by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoterm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoterm_details: Option<IncotermDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShipmentInfo {
    /// The trade term as stated on the document, whichever key carried it.
    pub fn stated_incoterm(&self) -> Option<&str> {
        self.incoterms
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.incoterm.as_deref())
    }
}

/// Catalog attributes copied onto a document for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncotermDetails {
    pub name: String,
    pub description_short: String,
    pub includes_insurance: bool,
    pub includes_duties_taxes: bool,
    pub includes_export_clearance: bool,
    pub includes_import_clearance: bool,
    pub includes_pre_carriage: bool,
    pub includes_main_carriage: bool,
    pub transport_mode: Value,
    pub valuation_basis: Value,
    pub risk_transfer_point: String,
    pub notes: String,
}

impl From<&Incoterm> for IncotermDetails {
    fn from(term: &Incoterm) -> Self {
        Self {
            name: term.name.to_string(),
            description_short: term.description_short.to_string(),
            includes_insurance: term.includes_insurance,
            includes_duties_taxes: term.includes_duties_taxes,
            includes_export_clearance: term.includes_export_clearance,
            includes_import_clearance: term.includes_import_clearance,
            includes_pre_carriage: term.includes_pre_carriage,
            includes_main_carriage: term.includes_main_carriage,
            transport_mode: serde_json::to_value(term.transport_mode).unwrap_or(Value::Null),
            valuation_basis: serde_json::to_value(term.valuation_basis).unwrap_or(Value::Null),
            risk_transfer_point: term.risk_transfer_point.to_string(),
            notes: term.notes.to_string(),
        }
    }
}

/// One product line of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<ExtractedNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<ExtractedNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<ExtractedNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<ExtractedNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_of_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hts_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_calculation: Option<DutyCalculationResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    /// The stated HTS code, if it is not blank.
    pub fn classified_hts_code(&self) -> Option<&str> {
        self.hts_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    pub fn quantity(&self) -> Option<f64> {
        self.quantity.as_ref().and_then(ExtractedNumber::as_f64)
    }

    pub fn unit_price(&self) -> Option<f64> {
        self.unit_price.as_ref().and_then(ExtractedNumber::as_f64)
    }

    pub fn total_price(&self) -> Option<f64> {
        self.total_price.as_ref().and_then(ExtractedNumber::as_f64)
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight.as_ref().and_then(ExtractedNumber::as_f64)
    }
}

/// A numeric field exactly as extracted.
///
/// Reads leniently through [`lenient_number::parse`] but serializes the
/// original value, so `"12 kg"` or `"1,000"` survive a write-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedNumber(Value);

impl ExtractedNumber {
    /// The value as a number, if it reads as one.
    pub fn as_f64(&self) -> Option<f64> {
        lenient_number::parse(&self.0)
    }
}

impl From<f64> for ExtractedNumber {
    fn from(value: f64) -> Self {
        Self(Value::from(value))
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads numbers, numeric strings (`"1,250.50"`) and blanks.
///
/// Values that cannot be read as a number give `None` instead of failing
/// the whole document.
pub mod lenient_number {
    use serde_json::Value;

    pub fn parse(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| *c != ',' && !c.is_whitespace())
                    .collect();
                cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
            }
            _ => None,
        }
    }
}
