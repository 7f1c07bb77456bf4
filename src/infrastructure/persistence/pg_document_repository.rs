//! PostgreSQL implementation of the document repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewDocument, StoredDocument};
use crate::domain::repositories::DocumentRepository;
use crate::error::AppError;

/// Status of documents whose extraction finished.
const STATUS_PROCESSED: &str = "processed";

#[derive(sqlx::FromRow)]
struct StoredDocumentRow {
    id: i64,
    owner_id: String,
    file_name: String,
    status: String,
    created_at: DateTime<Utc>,
    parsed_id: i64,
    parsed_json: Value,
    extraction_confidence: Option<f64>,
    extraction_method: Option<String>,
    hts_codes: Vec<String>,
    primary_hts_code: Option<String>,
}

impl From<StoredDocumentRow> for StoredDocument {
    fn from(r: StoredDocumentRow) -> Self {
        StoredDocument {
            id: r.id,
            owner_id: r.owner_id,
            file_name: r.file_name,
            status: r.status,
            created_at: r.created_at,
            parsed_id: r.parsed_id,
            parsed_json: r.parsed_json,
            extraction_confidence: r.extraction_confidence,
            extraction_method: r.extraction_method,
            hts_codes: r.hts_codes,
            primary_hts_code: r.primary_hts_code,
        }
    }
}

/// PostgreSQL repository over `documents` and `document_parsed_data`.
///
/// A document may have several parsed payloads; the newest one is used.
pub struct PgDocumentRepository {
    pool: Arc<PgPool>,
}

impl PgDocumentRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, document: NewDocument) -> Result<StoredDocument, AppError> {
        let extracted = serde_json::to_value(&document.extracted).map_err(|e| {
            AppError::internal(
                "Failed to serialize document",
                json!({ "reason": e.to_string() }),
            )
        })?;
        let parsed_json = json!({
            "documentType": document.document_type,
            "extractedData": extracted,
        });

        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO documents (owner_id, file_name, file_type, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(&document.owner_id)
        .bind(&document.file_name)
        .bind(&document.file_type)
        .bind(STATUS_PROCESSED)
        .fetch_one(&mut *tx)
        .await?;

        let parsed_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_parsed_data
                (document_id, parsed_json, extraction_confidence, extraction_method,
                 hts_codes, primary_hts_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&parsed_json)
        .bind(document.extraction_confidence)
        .bind(&document.extraction_method)
        .bind(&document.hts_codes)
        .bind(&document.primary_hts_code)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(StoredDocument {
            id,
            owner_id: document.owner_id,
            file_name: document.file_name,
            status: STATUS_PROCESSED.to_string(),
            created_at,
            parsed_id,
            parsed_json,
            extraction_confidence: document.extraction_confidence,
            extraction_method: Some(document.extraction_method),
            hts_codes: document.hts_codes,
            primary_hts_code: document.primary_hts_code,
        })
    }

    async fn latest_processed(
        &self,
        owner_id: &str,
        limit: i64,
    ) -> Result<Vec<StoredDocument>, AppError> {
        let rows = sqlx::query_as::<_, StoredDocumentRow>(
            r#"
            SELECT d.id, d.owner_id, d.file_name, d.status, d.created_at,
                   p.id AS parsed_id, p.parsed_json, p.extraction_confidence, p.extraction_method,
                   p.hts_codes, p.primary_hts_code
            FROM documents d
            JOIN LATERAL (
                SELECT id, parsed_json, extraction_confidence, extraction_method,
                       hts_codes, primary_hts_code
                FROM document_parsed_data
                WHERE document_id = d.id
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            ) p ON TRUE
            WHERE d.owner_id = $1
              AND d.status = $2
            ORDER BY d.created_at DESC, d.id DESC
            LIMIT $3
            "#,
        )
        .bind(owner_id)
        .bind(STATUS_PROCESSED)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(StoredDocument::from).collect())
    }

    async fn save_parsed(&self, parsed_id: i64, parsed_json: Value) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE document_parsed_data
            SET parsed_json = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(parsed_id)
        .bind(parsed_json)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Parsed document not found",
                json!({ "parsed_id": parsed_id }),
            ));
        }

        Ok(())
    }
}
