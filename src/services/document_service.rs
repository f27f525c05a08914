use crate::config::get_config;
use crate::error::{Error, Result};
use crate::models::document::{Document, DocumentType};
use crate::storage::Storage;
use crate::utils::signing;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, owner_id, document_type, file_path, file_size, file_type, is_verified, metadata, display_name, created_at, updated_at";

// Column list for deployments that predate the display_name migration.
const DOCUMENT_COLUMNS_LEGACY: &str = "id, owner_id, document_type, file_path, file_size, file_type, is_verified, metadata, NULL::text AS display_name, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner_id: Uuid,
    pub document_type: DocumentType,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub display_name: String,
    pub metadata: Option<JsonValue>,
}

/// Persistence seam for document rows, mockable so the upload/delete
/// failure policies can be tested without Postgres.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, doc: &NewDocument) -> Result<Document>;
    async fn get(&self, id: Uuid) -> Result<Option<Document>>;
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Document>>;
    /// Returns the deleted row, if any.
    async fn delete(&self, id: Uuid) -> Result<Option<Document>>;
    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Document>;
    async fn update_metadata(&self, id: Uuid, metadata: JsonValue) -> Result<Document>;
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn is_undefined_column(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("42703"))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, doc: &NewDocument) -> Result<Document> {
        let result = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (owner_id, document_type, file_path, file_size, file_type, metadata, display_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(doc.owner_id)
        .bind(doc.document_type)
        .bind(&doc.file_path)
        .bind(doc.file_size)
        .bind(&doc.file_type)
        .bind(&doc.metadata)
        .bind(&doc.display_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(document) => Ok(document),
            Err(err) if Self::is_undefined_column(&err) => {
                // Backward-compat shim: the display_name column is cosmetic
                // and absent on deployments that have not run the
                // document_display_name migration yet. Readers derive a
                // name from the file path instead.
                tracing::warn!(
                    "documents.display_name column missing, inserting without it; \
                     apply the document_display_name migration"
                );
                let document = sqlx::query_as::<_, Document>(&format!(
                    r#"
                    INSERT INTO documents (owner_id, document_type, file_path, file_size, file_type, metadata)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {}
                    "#,
                    DOCUMENT_COLUMNS_LEGACY
                ))
                .bind(doc.owner_id)
                .bind(doc.document_type)
                .bind(&doc.file_path)
                .bind(doc.file_size)
                .bind(&doc.file_type)
                .bind(&doc.metadata)
                .fetch_one(&self.pool)
                .await?;
                Ok(document)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {} FROM documents WHERE owner_id = $1 ORDER BY created_at DESC",
            DOCUMENT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Document>> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "DELETE FROM documents WHERE id = $1 RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "UPDATE documents SET is_verified = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(verified)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(document)
    }

    async fn update_metadata(&self, id: Uuid, metadata: JsonValue) -> Result<Document> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "UPDATE documents SET metadata = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(metadata)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(document)
    }
}

const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "rtf", "jpg", "jpeg", "png", "webp",
];

#[derive(Debug, Clone, serde::Serialize)]
pub struct SignedDownload {
    pub url: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn Storage>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, storage: Arc<dyn Storage>) -> Self {
        Self { store, storage }
    }

    /// Storage first, then the database record. A failed insert triggers a
    /// compensating storage delete so list views never see an orphaned
    /// object; a failed compensation is logged once, not retried.
    pub async fn upload(
        &self,
        owner_id: Uuid,
        document_type: DocumentType,
        file_name: &str,
        data: &[u8],
        metadata: Option<JsonValue>,
    ) -> Result<Document> {
        let ext = validate_file(file_name, data)?;
        let key = format!("documents/{}.{}", Uuid::new_v4(), ext);

        self.storage.upload(&key, data).await?;

        let new_doc = NewDocument {
            owner_id,
            document_type,
            file_path: key.clone(),
            file_size: data.len() as i64,
            file_type: content_type_for(&ext).to_string(),
            display_name: file_name.to_string(),
            metadata,
        };

        match self.store.insert(&new_doc).await {
            Ok(document) => Ok(document),
            Err(err) => {
                if let Err(cleanup_err) = self.storage.delete(&key).await {
                    tracing::error!(
                        "Failed to remove orphaned storage object {}: {}",
                        key,
                        cleanup_err
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        self.store.get(id).await
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        self.store.list_by_owner(owner_id).await
    }

    pub async fn set_verified(&self, id: Uuid, verified: bool) -> Result<Document> {
        self.store.set_verified(id, verified).await
    }

    pub async fn update_metadata(&self, id: Uuid, metadata: JsonValue) -> Result<Document> {
        self.store.update_metadata(id, metadata).await
    }

    /// The database row is authoritative: once it is gone the delete has
    /// succeeded from the caller's perspective, even if removing the
    /// storage object fails afterwards.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| Error::NotFound("Document not found".to_string()))?;

        if let Err(err) = self.storage.delete(&deleted.file_path).await {
            tracing::warn!(
                "Document {} deleted but storage object {} could not be removed: {}",
                id,
                deleted.file_path,
                err
            );
        }
        Ok(())
    }

    pub fn issue_download_url(&self, document: &Document) -> SignedDownload {
        let config = get_config();
        let expires_at =
            crate::utils::time::now().timestamp() + config.signed_url_ttl_secs as i64;
        let signature = signing::sign_download(
            &config.signed_url_secret,
            &document.file_path,
            expires_at,
        );
        SignedDownload {
            url: format!(
                "/api/documents/{}/download?expires={}&signature={}",
                document.id, expires_at, signature
            ),
            expires_at,
        }
    }

    pub async fn download(
        &self,
        id: Uuid,
        expires_at: i64,
        signature: &str,
    ) -> Result<(Document, Vec<u8>)> {
        let document = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound("Document not found".to_string()))?;

        let config = get_config();
        let valid = signing::verify_download(
            &config.signed_url_secret,
            &document.file_path,
            expires_at,
            signature,
            crate::utils::time::now().timestamp(),
        );
        if !valid {
            return Err(Error::BadRequest(
                "Download link is invalid or has expired".to_string(),
            ));
        }

        let data = self.storage.download(&document.file_path).await?;
        Ok((document, data))
    }
}

fn validate_file(file_name: &str, data: &[u8]) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::BadRequest(format!(
            "File type .{} is not allowed",
            ext
        )));
    }
    if data.is_empty() {
        return Err(Error::BadRequest("Uploaded file is empty".to_string()));
    }
    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    if (ext == "jpg" || ext == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::BadRequest("Invalid JPEG file content".into()));
    }
    if ext == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Err(Error::BadRequest("Invalid PNG file content".into()));
    }
    Ok(ext)
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "rtf" => "application/rtf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockStorage;
    use chrono::Utc;
    use mockall::predicate::*;

    fn sample_document(file_path: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            document_type: DocumentType::Resume,
            file_path: file_path.to_string(),
            file_size: 4,
            file_type: "text/plain".to_string(),
            is_verified: false,
            metadata: None,
            display_name: Some("resume.txt".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upload_compensates_storage_on_insert_failure() {
        let mut storage = MockStorage::new();
        storage
            .expect_upload()
            .times(1)
            .returning(|_, _| Ok(()));
        // the compensating delete must run exactly once
        storage
            .expect_delete()
            .times(1)
            .returning(|_| Ok(()));

        let mut store = MockDocumentStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(Error::Internal("insert failed".to_string())));

        let service = DocumentService::new(Arc::new(store), Arc::new(storage));
        let result = service
            .upload(
                Uuid::new_v4(),
                DocumentType::Resume,
                "resume.txt",
                b"data",
                None,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn upload_failure_of_compensation_is_swallowed_but_upload_still_fails() {
        let mut storage = MockStorage::new();
        storage.expect_upload().times(1).returning(|_, _| Ok(()));
        storage
            .expect_delete()
            .times(1)
            .returning(|_| Err(Error::Storage("disk gone".to_string())));

        let mut store = MockDocumentStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(Error::Internal("insert failed".to_string())));

        let service = DocumentService::new(Arc::new(store), Arc::new(storage));
        let result = service
            .upload(
                Uuid::new_v4(),
                DocumentType::Resume,
                "resume.txt",
                b"data",
                None,
            )
            .await;
        match result {
            Err(Error::Internal(msg)) => assert_eq!(msg, "insert failed"),
            other => panic!("expected the original insert error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_success_keeps_storage_object() {
        let mut storage = MockStorage::new();
        storage.expect_upload().times(1).returning(|_, _| Ok(()));
        storage.expect_delete().times(0);

        let mut store = MockDocumentStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|doc| {
                let mut d = sample_document(&doc.file_path);
                d.owner_id = doc.owner_id;
                Ok(d)
            });

        let service = DocumentService::new(Arc::new(store), Arc::new(storage));
        let owner = Uuid::new_v4();
        let document = service
            .upload(owner, DocumentType::Resume, "resume.txt", b"data", None)
            .await
            .unwrap();
        assert_eq!(document.owner_id, owner);
        assert!(document.file_path.starts_with("documents/"));
    }

    #[tokio::test]
    async fn delete_succeeds_even_when_storage_removal_fails() {
        let doc = sample_document("documents/x.txt");
        let doc_clone = doc.clone();

        let mut store = MockDocumentStore::new();
        store
            .expect_delete()
            .with(eq(doc.id))
            .times(1)
            .returning(move |_| Ok(Some(doc_clone.clone())));

        let mut storage = MockStorage::new();
        storage
            .expect_delete()
            .with(eq("documents/x.txt"))
            .times(1)
            .returning(|_| Err(Error::Storage("unreachable".to_string())));

        let service = DocumentService::new(Arc::new(store), Arc::new(storage));
        service.delete(doc.id).await.expect("delete reports success");
    }

    #[tokio::test]
    async fn delete_missing_document_is_not_found() {
        let mut store = MockDocumentStore::new();
        store.expect_delete().times(1).returning(|_| Ok(None));
        let mut storage = MockStorage::new();
        storage.expect_delete().times(0);

        let service = DocumentService::new(Arc::new(store), Arc::new(storage));
        let result = service.delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn upload_rejects_disallowed_extension_before_any_io() {
        let mut storage = MockStorage::new();
        storage.expect_upload().times(0);
        let mut store = MockDocumentStore::new();
        store.expect_insert().times(0);

        let service = DocumentService::new(Arc::new(store), Arc::new(storage));
        let result = service
            .upload(Uuid::new_v4(), DocumentType::Other, "run.exe", b"MZ", None)
            .await;
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn pdf_magic_bytes_are_checked() {
        assert!(validate_file("cv.pdf", b"%PDF-1.7 ...").is_ok());
        assert!(validate_file("cv.pdf", b"not a pdf").is_err());
    }
}
