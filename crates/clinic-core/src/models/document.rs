//! Patient document metadata models.

use serde::{Deserialize, Serialize};

/// Metadata for a patient document, keyed by `patient_id → document_id`.
///
/// The `file_*` fields are set only when a physical file was copied into
/// the per-patient storage directory; metadata and file are created and
/// deleted together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMeta {
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub created_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Input for attaching a new document.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    /// Caller-supplied ID; generated when absent
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub date: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}

/// Partial update for document metadata.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}
