//! Deterministic duty-rate interpreter for offline use.
//!
//! Understands the common shapes of tariff rate text:
//!
//! - `Free`, including special-program forms like `Free (A,AU,CA)`
//! - ad valorem percentages: `3.4%`
//! - specific rates in dollars or cents per mass or count unit: `$0.44/kg`,
//!   `5¢/lb`, `10¢/No.`, `60¢/doz.`
//!
//! Rates per any other unit (liters, square meters) are rejected rather than
//! guessed.
//! - compounds joined by `+`: `5¢/kg + 2%`
//!
//! Trade agreement eligibility is not evaluated; the selected rate is
//! applied as-is.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

use crate::domain::interpreter::{
    DutyRateInterpreter, DutyRateRequest, InterpreterError, LineItemFinancials,
};

static AD_VALOREM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*%$").unwrap());

static SPECIFIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\$)?\s*(\d+(?:\.\d+)?)\s*(¢|c)?\s*/\s*([A-Za-z][A-Za-z0-9 .]*)$").unwrap()
});

static PROGRAM_LIST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());

const KG_PER_LB: f64 = 0.453_592_37;

/// One parsed component of a rate expression.
#[derive(Debug, Clone, PartialEq)]
enum RateComponent {
    Free,
    AdValorem { percent: f64 },
    Specific { dollars: f64, unit: String },
}

fn parse_component(text: &str) -> Option<RateComponent> {
    let text = text.trim();

    if text.to_ascii_lowercase().starts_with("free") {
        return Some(RateComponent::Free);
    }

    if let Some(caps) = AD_VALOREM.captures(text) {
        let percent = caps[1].parse().ok()?;
        return Some(RateComponent::AdValorem { percent });
    }

    if let Some(caps) = SPECIFIC.captures(text) {
        let amount: f64 = caps[2].parse().ok()?;
        let dollars = if caps.get(3).is_some() && caps.get(1).is_none() {
            amount / 100.0
        } else {
            amount
        };
        let unit = caps[4].trim().trim_end_matches('.').to_ascii_lowercase();
        return Some(RateComponent::Specific { dollars, unit });
    }

    None
}

/// Parses a rate expression into its components.
///
/// Special-program lists such as `(A+,AU,CA)` are dropped first.
fn parse_rate(rate: &str) -> Option<Vec<RateComponent>> {
    let rate = PROGRAM_LIST.replace_all(rate, "");
    let rate = rate.trim();
    if rate.is_empty() {
        return Some(vec![RateComponent::Free]);
    }
    rate.split('+').map(parse_component).collect()
}

/// Kilograms in one unit of mass, for the mass units rates and invoices use.
fn kg_per_unit(unit: &str) -> Option<f64> {
    match unit {
        "kg" | "kgs" | "kilogram" | "kilograms" => Some(1.0),
        "g" | "gram" | "grams" => Some(0.001),
        "lb" | "lbs" | "pound" | "pounds" => Some(KG_PER_LB),
        "t" | "mt" | "ton" | "tonne" | "tonnes" => Some(1000.0),
        _ => None,
    }
}

/// Items in one unit of count, for the count units rates use.
fn items_per_unit(unit: &str) -> Option<f64> {
    match unit {
        "no" | "pcs" | "pc" | "piece" | "pieces" | "unit" | "units" | "each" | "ea" | "item"
        | "items" => Some(1.0),
        "pair" | "pairs" | "pr" | "prs" => Some(1.0),
        "doz" | "dozen" => Some(12.0),
        "gross" => Some(144.0),
        _ => None,
    }
}

/// Weight in kilograms, if known.
fn weight_kg(item: &LineItemFinancials) -> Option<f64> {
    let weight = item.weight?;
    let unit = item
        .weight_unit
        .as_deref()
        .unwrap_or("kg")
        .trim()
        .trim_end_matches('.')
        .to_ascii_lowercase();
    kg_per_unit(&unit).map(|factor| weight * factor)
}

/// Amount of the item measured in the rate's `unit`.
fn basis_for(unit: &str, item: &LineItemFinancials) -> Result<f64, InterpreterError> {
    if let Some(factor) = kg_per_unit(unit) {
        let kg = weight_kg(item).ok_or_else(|| {
            InterpreterError::InvalidResponse(format!(
                "rate is per {unit} but the item has no usable weight"
            ))
        })?;
        return Ok(kg / factor);
    }

    if let Some(per_unit) = items_per_unit(unit) {
        return Ok(item.quantity / per_unit);
    }

    Err(InterpreterError::InvalidResponse(format!(
        "unsupported rate unit: {unit}"
    )))
}

/// Evaluates one component against the item, returning the duty and a
/// human-readable step.
fn evaluate(
    component: &RateComponent,
    item: &LineItemFinancials,
) -> Result<(f64, String), InterpreterError> {
    match component {
        RateComponent::Free => Ok((0.0, "Free: no duty".to_string())),
        RateComponent::AdValorem { percent } => {
            let duty = item.total_price * percent / 100.0;
            Ok((
                duty,
                format!("{} {} x {percent}% = {duty:.2}", item.total_price, item.currency),
            ))
        }
        RateComponent::Specific { dollars, unit } => {
            let basis = basis_for(unit, item)?;
            let duty = basis * dollars;
            Ok((duty, format!("{basis} {unit} x ${dollars}/{unit} = {duty:.2}")))
        }
    }
}

/// Rule-based [`DutyRateInterpreter`].
///
/// Produces the same JSON answer shape a reasoning model is asked for.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedInterpreter;

impl RuleBasedInterpreter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DutyRateInterpreter for RuleBasedInterpreter {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn interpret(&self, request: &DutyRateRequest) -> Result<String, InterpreterError> {
        let rate = request.hts.selected_rate.as_deref().unwrap_or("");
        let components = parse_rate(rate).ok_or_else(|| {
            InterpreterError::InvalidResponse(format!("unrecognized rate expression: {rate}"))
        })?;

        let mut total = 0.0;
        let mut steps = Vec::with_capacity(components.len());
        for component in &components {
            let (duty, step) = evaluate(component, &request.item)?;
            total += duty;
            steps.push(step);
        }

        let calculated_duty = (total * 100.0).round() / 100.0;
        let is_duty_free = components.iter().all(|c| *c == RateComponent::Free);

        Ok(json!({
            "dutyRate": if rate.trim().is_empty() { "Free" } else { rate },
            "dutyRateType": request.hts.selected_rate_type.map(|t| t.as_str()),
            "additionalDuties": request.hts.additional_duties,
            "calculatedDuty": calculated_duty,
            "calculationBreakdown": steps.join("; "),
            "currency": request.item.currency,
            "freeTradeAgreement": null,
            "ftaBenefit": null,
            "isDutyFree": is_duty_free,
        })
        .to_string())
    }
}
