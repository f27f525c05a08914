use crate::dto::interview_dto::DirectInterviewPayload;
use crate::error::{Error, Result};
use crate::services::interview_service::NewInterview;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

/// Direct interview invitation: no application record exists or is created.
pub async fn create_direct_interview(
    State(state): State<AppState>,
    Json(payload): Json<DirectInterviewPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let details = NewInterview {
        interview_type: payload.details.interview_type,
        format: payload.details.format,
        scheduled_at: payload.details.scheduled_at,
        duration_minutes: payload.details.duration_minutes,
        interviewer_ref: payload.details.interviewer_ref,
    };
    let interview = state
        .interview_service
        .create_direct(payload.candidate_id, payload.job_id, details)
        .await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

pub async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let interview = state
        .interview_service
        .get_interview(id)
        .await?
        .ok_or_else(|| Error::NotFound("Interview not found".into()))?;
    Ok(Json(interview))
}

pub async fn list_application_interviews(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let interviews = state
        .interview_service
        .list_for_application(application_id)
        .await?;
    Ok(Json(interviews))
}
