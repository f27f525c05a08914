use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Resume,
    CoverLetter,
    Certificate,
    Portfolio,
    Reference,
    Passport,
    Visa,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::CoverLetter => "cover_letter",
            DocumentType::Certificate => "certificate",
            DocumentType::Portfolio => "portfolio",
            DocumentType::Reference => "reference",
            DocumentType::Passport => "passport",
            DocumentType::Visa => "visa",
            DocumentType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub document_type: DocumentType,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub is_verified: bool,
    pub metadata: Option<JsonValue>,
    // Nullable on deployments that predate the display_name migration.
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Display name, falling back to the stored file name when the column
    /// is absent or empty on older deployments.
    pub fn display_name_or_derived(&self) -> String {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self
                .file_path
                .rsplit('/')
                .next()
                .unwrap_or(self.file_path.as_str())
                .to_string(),
        }
    }
}
