//! Duty calculation results attached to documents and line items.

use serde::{Deserialize, Serialize};

/// Duty computed for one line item.
///
/// Either attached in full to a line item or not attached at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyCalculationResult {
    #[serde(default)]
    pub hts_number: String,
    pub duty_rate: String,
    #[serde(default)]
    pub duty_rate_type: String,
    #[serde(default)]
    pub additional_duties: Option<String>,
    pub calculated_duty: f64,
    #[serde(default)]
    pub calculation_breakdown: String,
    pub currency: String,
    #[serde(default)]
    pub free_trade_agreement: Option<String>,
    #[serde(default)]
    pub fta_benefit: Option<f64>,
    #[serde(default)]
    pub is_duty_free: bool,
}

/// Document-level listing of a contributing item's calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyCalculationEntry {
    /// The code as stated on the document, before format normalization.
    pub hts_code: String,
    #[serde(flatten)]
    pub calculation: DutyCalculationResult,
}

/// One contributing item in [`TotalDuties::breakdown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyBreakdownEntry {
    pub hts_code: String,
    pub duty: f64,
}

/// Sum of all successfully calculated item duties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalDuties {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub breakdown: Vec<DutyBreakdownEntry>,
}

impl TotalDuties {
    /// Whether the total carries an amount, i.e. duties were already worked out.
    pub fn is_calculated(&self) -> bool {
        self.amount.is_some()
    }
}
