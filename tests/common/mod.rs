#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, middleware, routing::get};
use chrono::Utc;
use customs_docs::api;
use customs_docs::api::handlers::health_handler;
use customs_docs::api::middleware::auth;
use customs_docs::application::services::auth_service::hash_token;
use customs_docs::domain::entities::{HtsRow, NewDocument, StoredDocument};
use customs_docs::domain::repositories::{
    ApiToken, DocumentRepository, HtsRepository, TokenRepository,
};
use customs_docs::error::AppError;
use customs_docs::infrastructure::reasoning::RuleBasedInterpreter;
use customs_docs::state::{AppState, ServiceSettings};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_SECRET: &str = "test-signing-secret";
pub const TEST_TOKEN: &str = "test-token-acme";
pub const TEST_OWNER: &str = "acme-imports";
pub const OTHER_TOKEN: &str = "test-token-globex";
pub const OTHER_OWNER: &str = "globex";
pub const REVOKED_TOKEN: &str = "test-token-revoked";

/// HTS reference table kept in a sorted map.
#[derive(Default)]
pub struct InMemoryHtsRepository {
    rows: Mutex<BTreeMap<String, HtsRow>>,
}

impl InMemoryHtsRepository {
    pub fn with_rows(rows: Vec<HtsRow>) -> Self {
        Self {
            rows: Mutex::new(rows.into_iter().map(|r| (r.hts_number.clone(), r)).collect()),
        }
    }
}

#[async_trait]
impl HtsRepository for InMemoryHtsRepository {
    async fn find_by_number(&self, hts_number: &str) -> Result<Option<HtsRow>, AppError> {
        Ok(self.rows.lock().unwrap().get(hts_number).cloned())
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Option<HtsRow>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| r.hts_number.starts_with(prefix))
            .cloned())
    }

    async fn search_by_description(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<HtsRow>, AppError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| {
                let description = r.description.to_lowercase();
                terms.iter().all(|t| description.contains(&t.to_lowercase()))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn upsert_batch(&self, rows: Vec<HtsRow>) -> Result<u64, AppError> {
        let mut table = self.rows.lock().unwrap();
        let written = rows.len() as u64;
        for row in rows {
            table.insert(row.hts_number.clone(), row);
        }
        Ok(written)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

/// Token store keyed by HMAC hash, like the database.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: Mutex<Vec<ApiToken>>,
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn find_active(&self, token_hash: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token_hash == token_hash && !t.is_revoked())
            .cloned())
    }

    async fn touch(&self, token_id: i64) -> Result<(), AppError> {
        if let Some(token) = self.tokens.lock().unwrap().iter_mut().find(|t| t.id == token_id) {
            token.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create(&self, name: &str, token_hash: &str) -> Result<ApiToken, AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        let token = ApiToken {
            id: tokens.len() as i64 + 1,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };
        tokens.push(token.clone());
        Ok(token)
    }

    async fn list(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(self.tokens.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn revoke(&self, id: i64) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.id == id && !t.is_revoked()) {
            Some(token) => {
                token.revoked_at = Some(Utc::now());
                Ok(())
            }
            None => Err(AppError::not_found(
                "Token not found or already revoked",
                json!({ "id": id }),
            )),
        }
    }
}

/// Document store that records every write-back.
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<Vec<StoredDocument>>,
    pub saves: Mutex<Vec<(i64, Value)>>,
}

impl InMemoryDocumentRepository {
    /// Inserts a processed document with a raw parsed payload.
    pub fn seed(&self, owner_id: &str, file_name: &str, parsed_json: Value, confidence: f64) -> i64 {
        let mut documents = self.documents.lock().unwrap();
        let id = documents.len() as i64 + 1;
        documents.push(StoredDocument {
            id,
            owner_id: owner_id.to_string(),
            file_name: file_name.to_string(),
            status: "processed".to_string(),
            created_at: Utc::now(),
            parsed_id: id * 10,
            parsed_json,
            extraction_confidence: Some(confidence),
            extraction_method: None,
            hts_codes: Vec::new(),
            primary_hts_code: None,
        });
        id
    }

    pub fn parsed_json(&self, id: i64) -> Option<Value> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.parsed_json.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn insert(&self, document: NewDocument) -> Result<StoredDocument, AppError> {
        let extracted = serde_json::to_value(&document.extracted)
            .map_err(|e| AppError::internal("Failed to serialize document", json!({ "reason": e.to_string() })))?;
        let mut documents = self.documents.lock().unwrap();
        let id = documents.len() as i64 + 1;
        let stored = StoredDocument {
            id,
            owner_id: document.owner_id,
            file_name: document.file_name,
            status: "processed".to_string(),
            created_at: Utc::now(),
            parsed_id: id * 10,
            parsed_json: json!({
                "documentType": document.document_type,
                "extractedData": extracted,
            }),
            extraction_confidence: document.extraction_confidence,
            extraction_method: Some(document.extraction_method),
            hts_codes: document.hts_codes,
            primary_hts_code: document.primary_hts_code,
        };
        documents.push(stored.clone());
        Ok(stored)
    }

    async fn latest_processed(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> Result<Vec<StoredDocument>, AppError> {
        // Newest first: later inserts have higher ids.
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|d| d.owner_id == owner_id && d.status == "processed")
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn save_parsed(&self, parsed_id: i64, parsed_json: Value) -> Result<(), AppError> {
        let mut documents = self.documents.lock().unwrap();
        let Some(document) = documents.iter_mut().find(|d| d.parsed_id == parsed_id) else {
            return Err(AppError::not_found("Parsed data not found", json!({ "id": parsed_id })));
        };
        document.parsed_json = parsed_json.clone();
        self.saves.lock().unwrap().push((parsed_id, parsed_json));
        Ok(())
    }
}

pub fn hts_row(
    hts_number: &str,
    description: &str,
    general: Option<&str>,
    special: Option<&str>,
    column_2: Option<&str>,
) -> HtsRow {
    HtsRow {
        hts_number: hts_number.to_string(),
        description: description.to_string(),
        general_rate_of_duty: general.map(str::to_string),
        special_rate_of_duty: special.map(str::to_string),
        column_2_rate_of_duty: column_2.map(str::to_string),
        unit_of_quantity: vec!["No.".to_string()],
        additional_duties: None,
    }
}

/// A small slice of the tariff schedule.
///
/// Column 2 takes precedence when present, so laptops price at 35% and
/// cotton T-shirts at the general 16.5%.
pub fn reference_rows() -> Vec<HtsRow> {
    vec![
        hts_row(
            "8471.30.01.00",
            "Portable automatic data processing machines, weighing not more than 10 kg",
            Some("Free"),
            None,
            Some("35%"),
        ),
        hts_row(
            "6109.10.00.12",
            "T-shirts, knitted, of cotton, men's or boys'",
            Some("16.5%"),
            None,
            None,
        ),
        hts_row(
            "0901.21.00.20",
            "Coffee, roasted, not decaffeinated",
            Some("Free"),
            None,
            None,
        ),
    ]
}

pub struct TestContext {
    pub state: AppState,
    pub hts: Arc<InMemoryHtsRepository>,
    pub documents: Arc<InMemoryDocumentRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
}

/// Builds state over in-memory stores with the rule-based interpreter and
/// three tokens: two active owners and one revoked.
pub async fn create_test_context() -> TestContext {
    let hts = Arc::new(InMemoryHtsRepository::with_rows(reference_rows()));
    let documents = Arc::new(InMemoryDocumentRepository::default());
    let tokens = Arc::new(InMemoryTokenRepository::default());

    tokens
        .create(TEST_OWNER, &hash_token(TEST_SECRET, TEST_TOKEN))
        .await
        .unwrap();
    tokens
        .create(OTHER_OWNER, &hash_token(TEST_SECRET, OTHER_TOKEN))
        .await
        .unwrap();
    let revoked = tokens
        .create("old-integration", &hash_token(TEST_SECRET, REVOKED_TOKEN))
        .await
        .unwrap();
    tokens.revoke(revoked.id).await.unwrap();

    let state = AppState::new(
        tokens.clone(),
        hts.clone(),
        documents.clone(),
        Arc::new(RuleBasedInterpreter::new()),
        ServiceSettings {
            token_signing_secret: TEST_SECRET.to_string(),
            reasoning_timeout: Duration::from_secs(5),
            duty_concurrency: 4,
        },
    );

    TestContext {
        state,
        hts,
        documents,
        tokens,
    }
}

/// The application routes without rate limiting, which needs a peer address.
pub fn test_app(state: AppState) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
