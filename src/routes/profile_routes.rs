use crate::dto::profile_dto::{CreateCandidatePayload, CreateJobPayload, UpdateCandidatePayload};
use crate::error::{Error, Result};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

pub async fn create_candidate(
    State(state): State<AppState>,
    Json(payload): Json<CreateCandidatePayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let candidate = state
        .candidate_service
        .create_candidate(
            payload.name,
            payload.email,
            payload.skills,
            payload.location,
            payload.willing_to_relocate,
            payload.experience_years,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let candidate = state
        .candidate_service
        .get_candidate(id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".into()))?;
    Ok(Json(candidate))
}

pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidatePayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let candidate = state
        .candidate_service
        .update_profile(
            id,
            payload.skills,
            payload.location,
            payload.willing_to_relocate,
            payload.experience_years,
        )
        .await?;
    Ok(Json(candidate))
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let job = state
        .job_service
        .create_job(
            payload.title,
            payload.company,
            payload.description,
            payload.required_skills,
            payload.location,
            payload.required_experience_years,
            payload.relocation_support,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let job = state
        .job_service
        .get_job(id)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".into()))?;
    Ok(Json(job))
}

pub async fn list_jobs(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse> {
    let jobs = state.job_service.list_jobs().await?;
    Ok(Json(jobs))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path((job_id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<impl axum::response::IntoResponse> {
    let breakdown = state.match_service.score(candidate_id, job_id).await?;
    Ok(Json(breakdown))
}
