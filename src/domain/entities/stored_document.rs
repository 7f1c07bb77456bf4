//! Persisted document records and their parsed payload.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::document::ExtractedDocument;

/// Document type assumed when the stored payload does not name one.
pub const DEFAULT_DOCUMENT_TYPE: &str = "commercial_invoice";

/// A processed upload together with its latest parsed JSON.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: i64,
    pub owner_id: String,
    pub file_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub parsed_id: i64,
    pub parsed_json: Value,
    /// Extraction confidence as a percentage (0-100).
    pub extraction_confidence: Option<f64>,
    pub extraction_method: Option<String>,
    /// HTS codes recorded alongside the payload.
    pub hts_codes: Vec<String>,
    pub primary_hts_code: Option<String>,
}

impl StoredDocument {
    /// The document type named in the payload, or the default.
    pub fn document_type(&self) -> String {
        self.parsed_json
            .get("documentType")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_DOCUMENT_TYPE)
            .to_string()
    }

    /// Returns the extracted data, whether nested under `extractedData` or
    /// stored flat.
    pub fn extracted_value(&self) -> &Value {
        self.parsed_json
            .get("extractedData")
            .filter(|v| v.is_object())
            .unwrap_or(&self.parsed_json)
    }

    /// Writes enriched data back into the payload shape it came from.
    pub fn with_extracted(&self, data: &ExtractedDocument) -> Result<Value, serde_json::Error> {
        let enriched = serde_json::to_value(data)?;

        let nested = self
            .parsed_json
            .get("extractedData")
            .is_some_and(Value::is_object);

        if nested {
            let mut payload = self.parsed_json.clone();
            if let Some(obj) = payload.as_object_mut() {
                obj.insert("extractedData".to_string(), enriched);
            }
            Ok(payload)
        } else {
            Ok(enriched)
        }
    }
}

/// Input for storing a newly extracted document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner_id: String,
    pub file_name: String,
    pub file_type: Option<String>,
    pub document_type: String,
    pub extracted: ExtractedDocument,
    pub extraction_confidence: Option<f64>,
    pub extraction_method: String,
    pub hts_codes: Vec<String>,
    pub primary_hts_code: Option<String>,
}
