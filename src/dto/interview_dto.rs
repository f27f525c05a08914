use crate::models::interview::InterviewFormat;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ScheduleInterviewPayload {
    #[validate(length(min = 1))]
    pub interview_type: String,
    pub format: InterviewFormat,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 5, max = 480, message = "Duration must be 5-480 minutes"))]
    pub duration_minutes: i32,
    pub interviewer_ref: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DirectInterviewPayload {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub details: ScheduleInterviewPayload,
}
