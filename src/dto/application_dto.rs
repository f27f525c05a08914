use crate::models::application::{Application, ApplicationStatus};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyPayload {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub resume_id: Option<Uuid>,
    pub cover_letter_id: Option<Uuid>,
    #[serde(default)]
    pub additional_document_ids: Vec<Uuid>,
    /// Question-key to free-text answer, immutable after submission.
    pub custom_questions: Option<JsonValue>,
    pub availability_date: Option<NaiveDate>,
    pub salary_expectation: Option<Decimal>,
    #[validate(length(min = 1, message = "visa_status must not be empty when provided"))]
    pub visa_status: Option<String>,
    #[validate(length(max = 4000, message = "motivation is limited to 4000 characters"))]
    pub motivation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvitePayload {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClosePayload {
    #[validate(length(min = 1, max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StepsResponse {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub accessible_steps: u8,
}

#[derive(Debug, Serialize)]
pub struct ApplicationWithScore {
    #[serde(flatten)]
    pub application: Application,
    pub current_match_score: Option<i32>,
}
