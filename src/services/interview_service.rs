use crate::error::{Error, Result};
use crate::models::interview::{Interview, InterviewFormat};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const INTERVIEW_COLUMNS: &str = "id, application_id, candidate_id, job_id, interview_type, format, scheduled_at, duration_minutes, status, interviewer_ref, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub interview_type: String,
    pub format: InterviewFormat,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub interviewer_ref: Option<String>,
}

#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
}

impl InterviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Direct interview invitation: no application record, the interview
    /// links candidate and job directly.
    pub async fn create_direct(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        details: NewInterview,
    ) -> Result<Interview> {
        if details.duration_minutes <= 0 {
            return Err(Error::BadRequest(
                "Interview duration must be positive".to_string(),
            ));
        }
        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews (application_id, candidate_id, job_id, interview_type, format, scheduled_at, duration_minutes, interviewer_ref)
            VALUES (NULL, $1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(candidate_id)
        .bind(job_id)
        .bind(&details.interview_type)
        .bind(details.format)
        .bind(details.scheduled_at)
        .bind(details.duration_minutes)
        .bind(&details.interviewer_ref)
        .fetch_one(&self.pool)
        .await?;
        Ok(interview)
    }

    pub async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>> {
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {} FROM interviews WHERE id = $1",
            INTERVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(interview)
    }

    pub async fn list_for_application(&self, application_id: Uuid) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {} FROM interviews WHERE application_id = $1 ORDER BY scheduled_at",
            INTERVIEW_COLUMNS
        ))
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    pub async fn count_for_application(&self, application_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM interviews WHERE application_id = $1",
        )
        .bind(application_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
