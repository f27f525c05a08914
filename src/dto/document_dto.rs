use crate::models::document::{Document, DocumentType};
use crate::services::document_service::SignedDownload;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub document_type: DocumentType,
    pub display_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub is_verified: bool,
    pub metadata: Option<JsonValue>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentResponse {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            owner_id: doc.owner_id,
            document_type: doc.document_type,
            display_name: doc.display_name_or_derived(),
            file_size: doc.file_size,
            file_type: doc.file_type.clone(),
            is_verified: doc.is_verified,
            metadata: doc.metadata.clone(),
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentWithDownload {
    #[serde(flatten)]
    pub document: DocumentResponse,
    pub download: SignedDownload,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub expires: i64,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPayload {
    pub is_verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct MetadataPayload {
    pub metadata: JsonValue,
}
