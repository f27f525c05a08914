use crate::dto::document_dto::{
    DocumentResponse, DocumentWithDownload, DownloadQuery, MetadataPayload, VerifyPayload,
};
use crate::error::{Error, Result};
use crate::models::document::DocumentType;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut owner_id: Option<Uuid> = None;
    let mut document_type: Option<DocumentType> = None;
    let mut metadata: Option<serde_json::Value> = None;
    let mut file: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "owner_id" => {
                let raw = field.text().await.unwrap_or_default();
                owner_id = raw.parse().ok();
            }
            "document_type" => {
                let raw = field.text().await.unwrap_or_default();
                document_type = serde_json::from_value(serde_json::Value::String(raw)).ok();
            }
            "metadata" => {
                let raw = field.text().await.unwrap_or_default();
                if let Ok(value) = serde_json::from_str(&raw) {
                    metadata = Some(value);
                }
            }
            "file" => {
                let filename = field.file_name().unwrap_or("document.bin").to_string();
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read uploaded bytes: {}", e);
                    Error::BadRequest("Failed to read file upload".into())
                })?;
                file = Some((filename, data));
            }
            _ => {}
        }
    }

    let owner_id = owner_id.ok_or_else(|| Error::BadRequest("owner_id is required".into()))?;
    let document_type =
        document_type.ok_or_else(|| Error::BadRequest("document_type is required".into()))?;
    let (filename, data) =
        file.ok_or_else(|| Error::BadRequest("A file is required".into()))?;

    let document = state
        .document_service
        .upload(owner_id, document_type, &filename, &data, metadata)
        .await
        .map_err(|e| {
            tracing::error!("Document upload failed for owner {}: {}", owner_id, e);
            e
        })?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(&document))))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let document = state
        .document_service
        .get_document(id)
        .await?
        .ok_or_else(|| Error::NotFound("Document not found".into()))?;
    let download = state.document_service.issue_download_url(&document);
    Ok(Json(DocumentWithDownload {
        document: DocumentResponse::from(&document),
        download,
    }))
}

pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse> {
    let (document, data) = state
        .document_service
        .download(id, query.expires, &query.signature)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, document.file_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                document.display_name_or_derived()
            ),
        ),
    ];
    Ok((headers, data))
}

pub async fn list_owner_documents(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let documents = state.document_service.list_for_owner(owner_id).await?;
    let responses: Vec<DocumentResponse> =
        documents.iter().map(DocumentResponse::from).collect();
    Ok(Json(responses))
}

pub async fn verify_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerifyPayload>,
) -> Result<impl IntoResponse> {
    let document = state
        .document_service
        .set_verified(id, payload.is_verified)
        .await?;
    Ok(Json(DocumentResponse::from(&document)))
}

pub async fn update_document_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MetadataPayload>,
) -> Result<impl IntoResponse> {
    let document = state
        .document_service
        .update_metadata(id, payload.metadata)
        .await?;
    Ok(Json(DocumentResponse::from(&document)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.document_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
