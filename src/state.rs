//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{
    AuthService, DocumentService, DutyCalculator, EnrichmentService, HtsService,
};
use crate::domain::interpreter::DutyRateInterpreter;
use crate::domain::repositories::{DocumentRepository, HtsRepository, TokenRepository};

/// Tunables for wiring the services together.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub token_signing_secret: String,
    pub reasoning_timeout: Duration,
    pub duty_concurrency: usize,
}

/// Services shared across requests.
///
/// Repositories are held as trait objects so the same state works over
/// PostgreSQL or in-memory stores.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService<dyn TokenRepository>>,
    pub hts_service: Arc<HtsService<dyn HtsRepository>>,
    pub enrichment_service: Arc<EnrichmentService<dyn HtsRepository>>,
    pub document_service: Arc<DocumentService<dyn DocumentRepository, dyn HtsRepository>>,
    pub interpreter: Arc<dyn DutyRateInterpreter>,
}

impl AppState {
    pub fn new(
        token_repository: Arc<dyn TokenRepository>,
        hts_repository: Arc<dyn HtsRepository>,
        document_repository: Arc<dyn DocumentRepository>,
        interpreter: Arc<dyn DutyRateInterpreter>,
        settings: ServiceSettings,
    ) -> Self {
        let auth_service = Arc::new(AuthService::new(
            token_repository,
            settings.token_signing_secret,
        ));
        let hts_service = Arc::new(HtsService::new(hts_repository));
        let calculator = Arc::new(DutyCalculator::new(
            interpreter.clone(),
            settings.reasoning_timeout,
        ));
        let enrichment_service = Arc::new(EnrichmentService::new(
            hts_service.clone(),
            calculator,
            settings.duty_concurrency,
        ));
        let document_service = Arc::new(DocumentService::new(
            document_repository,
            enrichment_service.clone(),
        ));

        Self {
            auth_service,
            hts_service,
            enrichment_service,
            document_service,
            interpreter,
        }
    }
}
