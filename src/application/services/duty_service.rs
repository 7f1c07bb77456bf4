//! Duty calculation for a single line item.
//!
//! The arithmetic itself is delegated to a [`DutyRateInterpreter`]; this
//! service bounds the call in time and holds every backend to the same
//! answer contract.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::document::lenient_number;
use crate::domain::entities::{DutyCalculationResult, HtsDutyRecord};
use crate::domain::interpreter::{
    DocumentContext, DutyRateInterpreter, DutyRateRequest, InterpreterError, LineItemFinancials,
};
use crate::utils::json_response::strip_code_fences;

/// Default upper bound for one interpreter call.
pub const DEFAULT_REASONING_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a line item's duty could not be calculated.
///
/// Per-item only: enrichment logs these and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DutyError {
    #[error("Interpreter call failed: {0}")]
    Interpreter(#[from] InterpreterError),

    #[error("Interpreter did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Malformed interpreter response: {0}")]
    MalformedResponse(String),

    #[error("Invalid duty calculation: {0}")]
    Validation(String),
}

impl DutyError {
    pub fn kind(&self) -> &'static str {
        match self {
            DutyError::Interpreter(_) => "interpreter",
            DutyError::Timeout(_) => "timeout",
            DutyError::MalformedResponse(_) => "malformed",
            DutyError::Validation(_) => "invalid",
        }
    }
}

/// Interpreter answer as received.
///
/// Fields are kept as raw JSON: only `calculatedDuty` is validated strictly,
/// everything else is coerced and falls back when unusable.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCalculation {
    duty_rate: Option<Value>,
    duty_rate_type: Option<Value>,
    additional_duties: Option<Value>,
    calculated_duty: Option<Value>,
    calculation_breakdown: Option<Value>,
    currency: Option<Value>,
    free_trade_agreement: Option<Value>,
    fta_benefit: Option<Value>,
    is_duty_free: Option<Value>,
}

/// Placeholders models write instead of leaving a field out.
const ABSENT_MARKERS: [&str; 4] = ["null", "none", "n/a", "undefined"];

/// Reads a text field, accepting numbers and treating blanks and
/// placeholders such as `"null"` as absent.
fn text(value: Option<Value>) -> Option<String> {
    let read = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let absent = read.is_empty()
        || ABSENT_MARKERS
            .iter()
            .any(|marker| read.eq_ignore_ascii_case(marker));
    (!absent).then_some(read)
}

/// Reads a yes/no field given as a boolean, string or 0/1.
fn flag(value: Option<Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Calculates line-item duties through a rate interpreter.
pub struct DutyCalculator {
    interpreter: Arc<dyn DutyRateInterpreter>,
    timeout: Duration,
}

impl DutyCalculator {
    pub fn new(interpreter: Arc<dyn DutyRateInterpreter>, timeout: Duration) -> Self {
        Self {
            interpreter,
            timeout,
        }
    }

    pub fn interpreter(&self) -> &Arc<dyn DutyRateInterpreter> {
        &self.interpreter
    }

    /// Calculates the duty owed on one line item.
    ///
    /// # Errors
    ///
    /// - [`DutyError::Timeout`] if the interpreter exceeds the configured timeout
    /// - [`DutyError::Interpreter`] if the interpreter call fails
    /// - [`DutyError::MalformedResponse`] if the answer is not a JSON object
    /// - [`DutyError::Validation`] if `calculatedDuty` is missing, non-numeric,
    ///   negative or not finite
    pub async fn calculate(
        &self,
        record: &HtsDutyRecord,
        financials: LineItemFinancials,
        context: DocumentContext,
    ) -> Result<DutyCalculationResult, DutyError> {
        let request = DutyRateRequest {
            hts: record.clone(),
            item: financials,
            context,
        };

        let outcome = tokio::time::timeout(self.timeout, self.interpreter.interpret(&request))
            .await
            .map_err(|_| DutyError::Timeout(self.timeout))
            .and_then(|answer| answer.map_err(DutyError::from))
            .and_then(|answer| parse_answer(&answer, &request));

        let label = match &outcome {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::counter!(
            "duty_calculations_total",
            "outcome" => label,
            "interpreter" => self.interpreter.name()
        )
        .increment(1);

        outcome
    }
}

fn parse_answer(
    answer: &str,
    request: &DutyRateRequest,
) -> Result<DutyCalculationResult, DutyError> {
    let payload = strip_code_fences(answer);
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| DutyError::MalformedResponse(e.to_string()))?;

    if !value.is_object() {
        return Err(DutyError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    }

    let raw: RawCalculation =
        serde_json::from_value(value).map_err(|e| DutyError::MalformedResponse(e.to_string()))?;

    let calculated_duty = raw
        .calculated_duty
        .as_ref()
        .ok_or_else(|| DutyError::Validation("calculatedDuty is missing".to_string()))
        .and_then(|v| {
            lenient_number::parse(v).ok_or_else(|| {
                DutyError::Validation(format!("calculatedDuty is not a number: {v}"))
            })
        })?;

    if !calculated_duty.is_finite() || calculated_duty < 0.0 {
        return Err(DutyError::Validation(format!(
            "calculatedDuty must be a non-negative amount, got {calculated_duty}"
        )));
    }

    let record = &request.hts;

    let duty_rate = text(raw.duty_rate)
        .or_else(|| record.selected_rate.clone())
        .unwrap_or_default();
    let duty_rate_type = text(raw.duty_rate_type)
        .or_else(|| record.selected_rate_type.map(|t| t.as_str().to_string()))
        .unwrap_or_else(|| "general".to_string());
    let is_duty_free =
        flag(raw.is_duty_free).unwrap_or(false) || duty_rate.trim().eq_ignore_ascii_case("free");

    Ok(DutyCalculationResult {
        hts_number: record.hts_number.clone(),
        duty_rate,
        duty_rate_type,
        additional_duties: text(raw.additional_duties)
            .or_else(|| record.additional_duties.clone()),
        calculated_duty,
        calculation_breakdown: text(raw.calculation_breakdown).unwrap_or_default(),
        currency: text(raw.currency).unwrap_or_else(|| request.item.currency.clone()),
        free_trade_agreement: text(raw.free_trade_agreement),
        fta_benefit: raw
            .fta_benefit
            .as_ref()
            .and_then(lenient_number::parse),
        is_duty_free,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RateType;
    use crate::domain::interpreter::{DEFAULT_DESTINATION_COUNTRY, MockDutyRateInterpreter};

    fn record() -> HtsDutyRecord {
        HtsDutyRecord {
            hts_number: "6109.10.00.12".to_string(),
            description: "T-shirts of cotton".to_string(),
            general_rate_of_duty: Some("16.5%".to_string()),
            special_rate_of_duty: Some("Free (AU,CA,MX)".to_string()),
            column_2_rate_of_duty: None,
            unit_of_quantity: vec!["doz.".to_string(), "kg".to_string()],
            additional_duties: None,
            selected_rate: Some("Free (AU,CA,MX)".to_string()),
            selected_rate_type: Some(RateType::Special),
        }
    }

    fn financials() -> LineItemFinancials {
        LineItemFinancials {
            description: "Cotton T-shirts".to_string(),
            quantity: 1200.0,
            unit_of_measure: Some("pcs".to_string()),
            unit_price: 2.5,
            total_price: 3000.0,
            weight: Some(180.0),
            weight_unit: Some("kg".to_string()),
            currency: "EUR".to_string(),
            country_of_origin: Some("MX".to_string()),
        }
    }

    fn context() -> DocumentContext {
        DocumentContext {
            origin_country: Some("MX".to_string()),
            destination_country: DEFAULT_DESTINATION_COUNTRY.to_string(),
            incoterm: Some("FOB".to_string()),
        }
    }

    fn calculator(answer: Result<&'static str, ()>) -> DutyCalculator {
        let mut mock = MockDutyRateInterpreter::new();
        mock.expect_name().return_const("mock");
        mock.expect_interpret().returning(move |_| match answer {
            Ok(text) => Ok(text.to_string()),
            Err(()) => Err(InterpreterError::Communication("connection reset".to_string())),
        });
        DutyCalculator::new(Arc::new(mock), DEFAULT_REASONING_TIMEOUT)
    }

    #[tokio::test]
    async fn test_parses_fenced_answer() {
        let calc = calculator(Ok(
            "```json\n{\"dutyRate\": \"16.5%\", \"dutyRateType\": \"general\", \"calculatedDuty\": 495, \"calculationBreakdown\": \"3000 x 16.5%\", \"currency\": \"USD\"}\n```",
        ));

        let result = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap();

        assert_eq!(result.hts_number, "6109.10.00.12");
        assert_eq!(result.duty_rate, "16.5%");
        assert_eq!(result.calculated_duty, 495.0);
        assert_eq!(result.currency, "USD");
        assert!(!result.is_duty_free);
    }

    #[tokio::test]
    async fn test_missing_fields_fall_back_to_record_and_item() {
        let calc = calculator(Ok("{\"calculatedDuty\": 0, \"freeTradeAgreement\": \"USMCA\", \"ftaBenefit\": \"495\"}"));

        let result = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap();

        assert_eq!(result.duty_rate, "Free (AU,CA,MX)");
        assert_eq!(result.duty_rate_type, "special");
        assert_eq!(result.currency, "EUR");
        assert_eq!(result.free_trade_agreement.as_deref(), Some("USMCA"));
        assert_eq!(result.fta_benefit, Some(495.0));
    }

    #[tokio::test]
    async fn test_free_rate_marks_duty_free() {
        let calc = calculator(Ok("{\"dutyRate\": \"Free\", \"calculatedDuty\": 0, \"currency\": \"USD\"}"));

        let result = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap();

        assert!(result.is_duty_free);
    }

    #[tokio::test]
    async fn test_loosely_typed_fields_are_coerced() {
        let calc = calculator(Ok(
            "{\"dutyRate\": 0, \"calculatedDuty\": \"12.50\", \"isDutyFree\": \"false\", \"currency\": \"USD\", \"freeTradeAgreement\": 7}",
        ));

        let result = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap();

        assert_eq!(result.duty_rate, "0");
        assert_eq!(result.calculated_duty, 12.5);
        assert!(!result.is_duty_free);
        assert_eq!(result.free_trade_agreement.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_placeholder_text_is_treated_as_absent() {
        let calc = calculator(Ok(
            "{\"dutyRate\": \"16.5%\", \"calculatedDuty\": 495, \"additionalDuties\": \"null\", \"currency\": \"N/A\", \"freeTradeAgreement\": \"None\", \"isDutyFree\": \"yes\"}",
        ));

        let result = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap();

        assert_eq!(result.additional_duties, None);
        assert_eq!(result.currency, "EUR");
        assert_eq!(result.free_trade_agreement, None);
        assert!(result.is_duty_free);
    }

    #[tokio::test]
    async fn test_missing_amount_is_rejected() {
        let calc = calculator(Ok("{\"dutyRate\": \"16.5%\", \"currency\": \"USD\"}"));

        let err = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap_err();

        assert!(matches!(err, DutyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_negative_amount_is_rejected() {
        let calc = calculator(Ok("{\"calculatedDuty\": -4.2}"));

        let err = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap_err();

        assert!(matches!(err, DutyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_json_answer_is_malformed() {
        let calc = calculator(Ok("The duty is about 495 USD."));

        let err = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap_err();

        assert!(matches!(err, DutyError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_interpreter_failure_is_reported() {
        let calc = calculator(Err(()));

        let err = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap_err();

        assert!(matches!(err, DutyError::Interpreter(_)));
        assert_eq!(err.kind(), "interpreter");
    }

    struct SlowInterpreter;

    #[async_trait::async_trait]
    impl DutyRateInterpreter for SlowInterpreter {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn interpret(&self, _request: &DutyRateRequest) -> Result<String, InterpreterError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{\"calculatedDuty\": 1}".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_interpreter_times_out() {
        let calc = DutyCalculator::new(Arc::new(SlowInterpreter), Duration::from_secs(5));

        let err = calc
            .calculate(&record(), financials(), context())
            .await
            .unwrap_err();

        assert!(matches!(err, DutyError::Timeout(d) if d == Duration::from_secs(5)));
    }
}
