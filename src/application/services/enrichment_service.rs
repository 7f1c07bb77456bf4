//! Document enrichment: Incoterm resolution followed by duty calculation.
//!
//! One call owns one document. Line items are priced concurrently, each
//! writing only its own slot, and the results are folded into a document
//! total afterwards.

use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use std::sync::Arc;

use super::duty_service::{DutyCalculator, DutyError};
use super::hts_service::HtsService;
use crate::domain::entities::{
    DutyBreakdownEntry, DutyCalculationEntry, DutyCalculationResult, ExtractedDocument,
    IncotermDetails, LineItem, TotalDuties,
};
use crate::domain::incoterms::{IncotermSource, resolve_incoterm};
use crate::domain::interpreter::{
    DEFAULT_CURRENCY, DEFAULT_DESTINATION_COUNTRY, DocumentContext, LineItemFinancials,
};
use crate::domain::repositories::HtsRepository;
use crate::error::AppError;

/// Default number of line items priced at the same time.
pub const DEFAULT_DUTY_CONCURRENCY: usize = 8;

/// Why duty calculation did not run (or produced nothing) for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The seller pays duties under the resolved term (DDP).
    IncotermIncludesDuties,
    /// A previous pass already wrote a duty total.
    AlreadyCalculated,
    /// No line item carries an HTS code.
    NoClassifiedItems,
    /// The reference store failed mid-batch; no duty figures were written.
    BatchFailed,
}

/// Progress of one enrichment pass. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "reason", rename_all = "snake_case")]
pub enum EnrichmentStage {
    NeedsIncoterm,
    IncotermResolved,
    DutiesSkipped(SkipReason),
    DutiesComputing,
    DutiesComputed,
}

/// Summary of what an enrichment pass did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    #[serde(flatten)]
    pub stage: EnrichmentStage,
    pub incoterm_code: &'static str,
    pub incoterm_source: IncotermSource,
    /// Line items with an HTS code that entered the duty phase.
    pub attempted: usize,
    pub succeeded: usize,
    /// Items whose duty calculation errored.
    pub failed: usize,
    /// Items whose code resolved to no reference record or no usable rate.
    pub unmatched: usize,
}

enum ItemOutcome {
    Priced(DutyCalculationResult),
    Unmatched,
    Failed(DutyError),
}

struct PricingJob {
    index: usize,
    hts_code: String,
    financials: LineItemFinancials,
}

/// Enriches extracted documents with Incoterm details and duties.
pub struct EnrichmentService<R: HtsRepository + ?Sized> {
    hts_service: Arc<HtsService<R>>,
    calculator: Arc<DutyCalculator>,
    concurrency: usize,
}

impl<R: HtsRepository + ?Sized> EnrichmentService<R> {
    /// Creates the service. `concurrency` is clamped to at least 1.
    pub fn new(
        hts_service: Arc<HtsService<R>>,
        calculator: Arc<DutyCalculator>,
        concurrency: usize,
    ) -> Self {
        Self {
            hts_service,
            calculator,
            concurrency: concurrency.max(1),
        }
    }

    /// Enriches `document` in place.
    ///
    /// Always writes the resolved Incoterm code and details. Duties are then
    /// calculated unless the term includes them, a total already exists, or
    /// no item is classified. Per-item failures leave that item without a
    /// `dutyCalculation` and out of the total. If the reference store fails,
    /// the duty phase is abandoned as a whole and no duty figures are
    /// written.
    ///
    /// Running it again on its own output performs no duty work.
    pub async fn enrich(
        &self,
        document: &mut ExtractedDocument,
    ) -> Result<EnrichmentReport, AppError> {
        let mut report = EnrichmentReport {
            stage: EnrichmentStage::NeedsIncoterm,
            incoterm_code: "",
            incoterm_source: IncotermSource::Defaulted,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            unmatched: 0,
        };

        let stated = document.shipment_info.stated_incoterm().map(str::to_string);
        let resolved = resolve_incoterm(stated.as_deref());
        let incoterm = resolved.incoterm;

        document.shipment_info.incoterm = Some(incoterm.code.to_string());
        document.shipment_info.incoterm_details = Some(IncotermDetails::from(incoterm));

        report.incoterm_code = incoterm.code;
        report.incoterm_source = resolved.source;
        report.stage = EnrichmentStage::IncotermResolved;

        tracing::info!(
            stated = stated.as_deref().unwrap_or(""),
            incoterm = incoterm.code,
            source = resolved.source.as_str(),
            "Incoterm resolved"
        );

        let jobs = self.pricing_jobs(document);

        let skip = if incoterm.includes_duties_taxes {
            Some(SkipReason::IncotermIncludesDuties)
        } else if document.has_total_duties() {
            Some(SkipReason::AlreadyCalculated)
        } else if jobs.is_empty() {
            Some(SkipReason::NoClassifiedItems)
        } else {
            None
        };

        if let Some(reason) = skip {
            tracing::info!(incoterm = incoterm.code, ?reason, "Skipping duty calculation");
            report.stage = EnrichmentStage::DutiesSkipped(reason);
            return Ok(report);
        }

        report.stage = EnrichmentStage::DutiesComputing;
        report.attempted = jobs.len();
        tracing::info!(items = jobs.len(), "Calculating duties");

        let context = DocumentContext {
            origin_country: document.shipment_info.origin_country.clone(),
            destination_country: document
                .shipment_info
                .destination_country
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESTINATION_COUNTRY.to_string()),
            incoterm: Some(incoterm.code.to_string()),
        };

        let outcomes: Result<Vec<(usize, String, ItemOutcome)>, AppError> =
            stream::iter(jobs)
                .map(|job| self.price_item(job, &context))
                .buffered(self.concurrency)
                .try_collect()
                .await;

        let outcomes = match outcomes {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(error = %e, "Duty calculation batch failed");
                report.stage = EnrichmentStage::DutiesSkipped(SkipReason::BatchFailed);
                return Ok(report);
            }
        };

        let mut priced = Vec::new();
        for (index, hts_code, outcome) in outcomes {
            match outcome {
                ItemOutcome::Priced(result) => priced.push((index, hts_code, result)),
                ItemOutcome::Unmatched => report.unmatched += 1,
                ItemOutcome::Failed(e) => {
                    report.failed += 1;
                    tracing::warn!(item = index, hts_code = %hts_code, error = %e, "Duty calculation failed for item");
                }
            }
        }

        report.succeeded = priced.len();
        apply_results(document, priced);
        report.stage = EnrichmentStage::DutiesComputed;

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            unmatched = report.unmatched,
            total = ?document.total_duties.as_ref().and_then(|t| t.amount),
            "Duty calculation finished"
        );

        Ok(report)
    }

    fn pricing_jobs(&self, document: &ExtractedDocument) -> Vec<PricingJob> {
        document
            .products
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                item.classified_hts_code().map(|code| PricingJob {
                    index,
                    hts_code: code.to_string(),
                    financials: financials_for(item, document),
                })
            })
            .collect()
    }

    async fn price_item(
        &self,
        job: PricingJob,
        context: &DocumentContext,
    ) -> Result<(usize, String, ItemOutcome), AppError> {
        let record = self.hts_service.find_hts_code(&job.hts_code).await?;

        let Some(record) = record.filter(|r| r.selected_rate.is_some()) else {
            tracing::debug!(item = job.index, hts_code = %job.hts_code, "No usable HTS rate for item");
            return Ok((job.index, job.hts_code, ItemOutcome::Unmatched));
        };

        let outcome = match self
            .calculator
            .calculate(&record, job.financials, context.clone())
            .await
        {
            Ok(result) => ItemOutcome::Priced(result),
            Err(e) => ItemOutcome::Failed(e),
        };

        Ok((job.index, job.hts_code, outcome))
    }
}

fn financials_for(item: &LineItem, document: &ExtractedDocument) -> LineItemFinancials {
    let quantity = item.quantity().unwrap_or(0.0);
    let unit_price = item.unit_price().unwrap_or(0.0);
    let non_blank = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    LineItemFinancials {
        description: item.description.clone(),
        quantity,
        unit_of_measure: non_blank(&item.unit_of_measure),
        unit_price,
        total_price: item.total_price().unwrap_or(quantity * unit_price),
        weight: item.weight(),
        weight_unit: non_blank(&item.weight_unit),
        currency: non_blank(&item.currency)
            .or_else(|| non_blank(&document.currency))
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        country_of_origin: non_blank(&item.country_of_origin)
            .or_else(|| non_blank(&document.shipment_info.origin_country)),
    }
}

/// Attaches successful results to their items and writes the document total.
///
/// Does nothing when no item succeeded.
fn apply_results(
    document: &mut ExtractedDocument,
    mut priced: Vec<(usize, String, DutyCalculationResult)>,
) {
    if priced.is_empty() {
        return;
    }
    priced.sort_by_key(|(index, _, _)| *index);

    let amount = priced.iter().map(|(_, _, r)| r.calculated_duty).sum::<f64>();
    let currency = priced[0].2.currency.clone();
    let breakdown = priced
        .iter()
        .map(|(_, hts_code, r)| DutyBreakdownEntry {
            hts_code: hts_code.clone(),
            duty: r.calculated_duty,
        })
        .collect();

    document.duty_calculations = priced
        .iter()
        .map(|(_, hts_code, r)| DutyCalculationEntry {
            hts_code: hts_code.clone(),
            calculation: r.clone(),
        })
        .collect();

    for (index, _, result) in priced {
        if let Some(item) = document.products.get_mut(index) {
            item.duty_calculation = Some(result);
        }
    }

    document.total_duties = Some(TotalDuties {
        amount: Some(amount),
        currency: Some(currency),
        breakdown,
    });
}
