//! Capability interface for interpreting free-text duty rates.
//!
//! Tariff rates are written as prose ("Free", "3.4%", "$0.44/kg",
//! "5¢/kg + 2%"), and free trade agreement eligibility depends on
//! origin/destination pairs. Turning that into a number is delegated to an
//! interpreter: in production a reasoning model, in tests a deterministic
//! rule-based implementation.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Write as _;

use crate::domain::entities::HtsDutyRecord;

/// Default destination country when the document names none.
pub const DEFAULT_DESTINATION_COUNTRY: &str = "US";
/// Currency assumed when neither the item nor the document names one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Errors raised by an interpreter backend.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Interpreter not configured: {0}")]
    NotConfigured(String),
}

impl InterpreterError {
    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            InterpreterError::Communication(_) => true,
            InterpreterError::Status { status, .. } => *status == 429 || *status >= 500,
            InterpreterError::InvalidResponse(_) | InterpreterError::NotConfigured(_) => false,
        }
    }
}

/// Commercial figures of one line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemFinancials {
    pub description: String,
    pub quantity: f64,
    pub unit_of_measure: Option<String>,
    pub unit_price: f64,
    pub total_price: f64,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub currency: String,
    pub country_of_origin: Option<String>,
}

/// Shipment facts that influence duty treatment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContext {
    pub origin_country: Option<String>,
    pub destination_country: String,
    pub incoterm: Option<String>,
}

/// Everything an interpreter needs to price one line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyRateRequest {
    pub hts: HtsDutyRecord,
    pub item: LineItemFinancials,
    pub context: DocumentContext,
}

impl DutyRateRequest {
    /// Renders the request as instructions for a reasoning model.
    ///
    /// The model must answer with a single JSON object; see
    /// [`crate::application::services::duty_service`] for how it is validated.
    pub fn prompt(&self) -> String {
        let item = &self.item;
        let hts = &self.hts;
        let origin = item
            .country_of_origin
            .as_deref()
            .or(self.context.origin_country.as_deref())
            .unwrap_or("Not specified");
        let na = |v: Option<&str>| v.filter(|s| !s.trim().is_empty()).unwrap_or("N/A").to_string();
        let rate_type = hts
            .selected_rate_type
            .map(|t| t.as_str())
            .unwrap_or("general");

        let mut p = String::with_capacity(4096);
        p.push_str(
            "You are an expert customs duty calculator following Incoterms 2020 rules. \
             Calculate the total duty cost for this product based on the HTS code duty rates, \
             considering free trade agreements (FTAs).\n\n",
        );

        p.push_str("PRODUCT INFORMATION:\n");
        let _ = writeln!(p, "- Description: {}", item.description);
        let _ = writeln!(
            p,
            "- Quantity: {} {}",
            item.quantity,
            item.unit_of_measure.as_deref().unwrap_or("units")
        );
        let _ = writeln!(p, "- Unit Price: {} {}", item.unit_price, item.currency);
        let _ = writeln!(p, "- Total Price: {} {}", item.total_price, item.currency);
        if let Some(weight) = item.weight {
            let _ = writeln!(
                p,
                "- Weight: {} {}",
                weight,
                item.weight_unit.as_deref().unwrap_or("kg")
            );
        }
        let _ = writeln!(p, "- Country of Origin: {origin}\n");

        p.push_str("SHIPMENT INFORMATION:\n");
        let _ = writeln!(p, "- Origin Country: {origin}");
        let _ = writeln!(p, "- Destination Country: {}", self.context.destination_country);
        let _ = writeln!(
            p,
            "- Incoterm: {}\n",
            self.context.incoterm.as_deref().unwrap_or("Not specified")
        );

        p.push_str("HTS CODE DUTY INFORMATION:\n");
        let _ = writeln!(p, "- HTS Number: {}", hts.hts_number);
        let _ = writeln!(p, "- General Rate of Duty: {}", na(hts.general_rate_of_duty.as_deref()));
        let _ = writeln!(p, "- Special Rate of Duty: {}", na(hts.special_rate_of_duty.as_deref()));
        let _ = writeln!(
            p,
            "- Column 2 Rate of Duty: {}",
            na(hts.column_2_rate_of_duty.as_deref())
        );
        let _ = writeln!(
            p,
            "- Selected Rate: {} ({})",
            na(hts.selected_rate.as_deref()),
            rate_type
        );
        let units = hts.unit_of_quantity.join(", ");
        let _ = writeln!(p, "- Unit of Quantity: {}", na(Some(&units)));
        let _ = writeln!(
            p,
            "- Additional Duties: {}\n",
            na(hts.additional_duties.as_deref())
        );

        p.push_str(
            "INCOTERMS 2020 RULES:\n\
             - Only DDP (Delivered Duty Paid) includes duties and taxes in the seller's responsibility\n\
             - All other Incoterms require the buyer to pay duties and taxes\n\
             - If the rate is \"Free\" or empty, no duty applies regardless of incoterm\n\
             - Valuation basis depends on incoterm (FOB, CIF, etc.)\n\n\
             FREE TRADE AGREEMENT (FTA) CONSIDERATIONS:\n\
             - USMCA: imports from Canada or Mexico to the US\n\
             - GSP: eligible developing countries\n\
             - Other bilateral FTAs: country-specific agreements\n\
             - If an FTA applies, use the special rate or \"Free\" instead of the selected rate \
             and report the benefit (general rate duty minus FTA rate duty)\n\n\
             CALCULATION RULES:\n\
             1. \"Free\" or empty rate: calculatedDuty 0 and isDutyFree true\n\
             2. Percentage rates (e.g. \"10%\") apply to the total price\n\
             3. Specific rates (e.g. \"5¢/kg\", \"$2.50/kg\", \"10¢/No.\") apply to weight or quantity\n\
             4. Add any additional duties on top of the base duty\n\
             5. Assume USD if no currency is given\n\n",
        );

        p.push_str("Return ONLY a JSON object of this shape, without markdown:\n");
        let _ = writeln!(
            p,
            "{{\"dutyRate\": \"10%\", \"dutyRateType\": \"{rate_type}\", \"additionalDuties\": null, \
             \"calculatedDuty\": 123.45, \"calculationBreakdown\": \"...\", \"currency\": \"{}\", \
             \"freeTradeAgreement\": null, \"ftaBenefit\": null, \"isDutyFree\": false}}",
            item.currency
        );

        p
    }
}

/// Turns an HTS rate record plus item data into a raw duty answer.
///
/// Implementations return the answer text (expected to be a JSON object);
/// parsing and validation are done by the caller so every backend is held
/// to the same contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DutyRateInterpreter: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    async fn interpret(&self, request: &DutyRateRequest) -> Result<String, InterpreterError>;

    /// Whether the backend is usable. Defaults to `true` for local backends.
    async fn health_check(&self) -> bool {
        true
    }
}
