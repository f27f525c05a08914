use crate::dto::application_dto::{
    ApplicationWithScore, ApplyPayload, ClosePayload, InvitePayload, StepsResponse,
};
use crate::dto::interview_dto::ScheduleInterviewPayload;
use crate::error::Result;
use crate::services::application_service::ApplicationSubmission;
use crate::services::interview_service::NewInterview;
use crate::{AppState, error::Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

pub async fn apply(
    State(state): State<AppState>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;

    // Also proves both profiles exist before any row is written.
    let breakdown = state
        .match_service
        .score(payload.candidate_id, payload.job_id)
        .await?;

    let submission = ApplicationSubmission {
        resume_id: payload.resume_id,
        cover_letter_id: payload.cover_letter_id,
        additional_document_ids: payload.additional_document_ids,
        custom_questions: payload.custom_questions,
        availability_date: payload.availability_date,
        salary_expectation: payload.salary_expectation,
        visa_status: payload.visa_status,
        motivation: payload.motivation,
    };

    let application = state
        .application_service
        .apply(payload.candidate_id, payload.job_id, breakdown.score, submission)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create application: {}", e);
            e
        })?;

    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn invite(
    State(state): State<AppState>,
    Json(payload): Json<InvitePayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let breakdown = state
        .match_service
        .score(payload.candidate_id, payload.job_id)
        .await?;
    let application = state
        .application_service
        .invite(payload.candidate_id, payload.job_id, breakdown.score)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let application = state
        .application_service
        .get_application(id)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".into()))?;
    Ok(Json(application))
}

pub async fn list_candidate_applications(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let applications = state
        .application_service
        .list_for_candidate(candidate_id)
        .await?;

    // Recompute live scores; the stored match_score is a cached derivation.
    let mut enriched = Vec::with_capacity(applications.len());
    for application in applications {
        let current = match state
            .match_service
            .score(application.candidate_id, application.job_id)
            .await
        {
            Ok(b) => Some(b.score),
            Err(e) => {
                tracing::warn!(
                    "Could not recompute score for application {}: {}",
                    application.id,
                    e
                );
                None
            }
        };
        enriched.push(ApplicationWithScore {
            application,
            current_match_score: current,
        });
    }
    Ok(Json(enriched))
}

pub async fn get_steps(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let (application, steps) = state.application_service.accessible_steps(id).await?;
    Ok(Json(StepsResponse {
        application_id: application.id,
        status: application.status,
        accessible_steps: steps,
    }))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let application = state.application_service.accept_invitation(id).await?;
    Ok(Json(application))
}

pub async fn decline_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClosePayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .decline_invitation(id, payload.reason)
        .await?;
    Ok(Json(application))
}

pub async fn begin_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let application = state.application_service.begin_review(id).await?;
    Ok(Json(application))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClosePayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let application = state.application_service.withdraw(id, payload.reason).await?;
    Ok(Json(application))
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleInterviewPayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let details = NewInterview {
        interview_type: payload.interview_type,
        format: payload.format,
        scheduled_at: payload.scheduled_at,
        duration_minutes: payload.duration_minutes,
        interviewer_ref: payload.interviewer_ref,
    };
    let (application, interview) = state
        .application_service
        .schedule_interview(id, details)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "application": application,
            "interview": interview,
        })),
    ))
}

pub async fn record_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let application = state.application_service.record_offer(id).await?;
    Ok(Json(application))
}

pub async fn record_hire(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let application = state.application_service.record_hire(id).await?;
    Ok(Json(application))
}

pub async fn record_rejection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClosePayload>,
) -> Result<impl axum::response::IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .record_rejection(id, payload.reason)
        .await?;
    Ok(Json(application))
}

pub async fn begin_visa_processing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let application = state.application_service.begin_visa_processing(id).await?;
    Ok(Json(application))
}

pub async fn begin_onboarding(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse> {
    let application = state.application_service.begin_onboarding(id).await?;
    Ok(Json(application))
}
