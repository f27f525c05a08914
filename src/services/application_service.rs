use crate::error::{Error, Result};
use crate::models::application::{next_status, Application, ApplicationStatus, Transition};
use crate::models::interview::Interview;
use crate::services::interview_service::NewInterview;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

const APPLICATION_COLUMNS: &str = "id, job_id, candidate_id, status, match_score, resume_id, cover_letter_id, additional_document_ids, custom_questions, availability_date, salary_expectation, visa_status, motivation, closed_reason, closed_at, applied_at, updated_at";

const INTERVIEW_COLUMNS: &str = "id, application_id, candidate_id, job_id, interview_type, format, scheduled_at, duration_minutes, status, interviewer_ref, created_at, updated_at";

/// Apply-time fields. Immutable after submission.
#[derive(Debug, Clone, Default)]
pub struct ApplicationSubmission {
    pub resume_id: Option<Uuid>,
    pub cover_letter_id: Option<Uuid>,
    pub additional_document_ids: Vec<Uuid>,
    pub custom_questions: Option<JsonValue>,
    pub availability_date: Option<NaiveDate>,
    pub salary_expectation: Option<Decimal>,
    pub visa_status: Option<String>,
    pub motivation: Option<String>,
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(application)
    }

    pub async fn list_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        let applications = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE candidate_id = $1 ORDER BY applied_at DESC",
            APPLICATION_COLUMNS
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    /// Candidate-initiated application, created in `applied`.
    pub async fn apply(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        match_score: i32,
        submission: ApplicationSubmission,
    ) -> Result<Application> {
        self.create(
            candidate_id,
            job_id,
            ApplicationStatus::Applied,
            match_score,
            submission,
        )
        .await
    }

    /// Employer-initiated invitation, created in `invited`. Every step past
    /// the job detail stays locked until the candidate accepts.
    pub async fn invite(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        match_score: i32,
    ) -> Result<Application> {
        self.create(
            candidate_id,
            job_id,
            ApplicationStatus::Invited,
            match_score,
            ApplicationSubmission::default(),
        )
        .await
    }

    async fn create(
        &self,
        candidate_id: Uuid,
        job_id: Uuid,
        status: ApplicationStatus,
        match_score: i32,
        submission: ApplicationSubmission,
    ) -> Result<Application> {
        let exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM applications WHERE job_id = $1 AND candidate_id = $2",
        )
        .bind(job_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;
        if exists.is_some() {
            return Err(Error::Conflict(
                "An application for this job already exists".to_string(),
            ));
        }

        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (job_id, candidate_id, status, match_score, resume_id, cover_letter_id,
                additional_document_ids, custom_questions, availability_date, salary_expectation, visa_status, motivation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .bind(candidate_id)
        .bind(status)
        .bind(match_score)
        .bind(submission.resume_id)
        .bind(submission.cover_letter_id)
        .bind(&submission.additional_document_ids)
        .bind(&submission.custom_questions)
        .bind(submission.availability_date)
        .bind(submission.salary_expectation)
        .bind(&submission.visa_status)
        .bind(&submission.motivation)
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    pub async fn accept_invitation(&self, id: Uuid) -> Result<Application> {
        self.transition(id, Transition::AcceptInvitation, None).await
    }

    pub async fn decline_invitation(&self, id: Uuid, reason: Option<String>) -> Result<Application> {
        self.transition(id, Transition::DeclineInvitation, reason).await
    }

    pub async fn begin_review(&self, id: Uuid) -> Result<Application> {
        self.transition(id, Transition::BeginReview, None).await
    }

    pub async fn withdraw(&self, id: Uuid, reason: Option<String>) -> Result<Application> {
        self.transition(id, Transition::Withdraw, reason).await
    }

    pub async fn record_offer(&self, id: Uuid) -> Result<Application> {
        self.transition(id, Transition::RecordOffer, None).await
    }

    pub async fn record_hire(&self, id: Uuid) -> Result<Application> {
        self.transition(id, Transition::RecordHire, None).await
    }

    pub async fn record_rejection(&self, id: Uuid, reason: Option<String>) -> Result<Application> {
        self.transition(id, Transition::RecordRejection, reason).await
    }

    pub async fn begin_visa_processing(&self, id: Uuid) -> Result<Application> {
        self.transition(id, Transition::BeginVisaProcessing, None).await
    }

    pub async fn begin_onboarding(&self, id: Uuid) -> Result<Application> {
        self.transition(id, Transition::BeginOnboarding, None).await
    }

    /// Creates the interview row and moves the application forward in one
    /// transaction, so a failed status update never leaves a stray
    /// interview behind.
    pub async fn schedule_interview(
        &self,
        id: Uuid,
        details: NewInterview,
    ) -> Result<(Application, Interview)> {
        let application = self
            .get_application(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        let next = next_status(application.status, Transition::ScheduleInterview)?;

        let mut tx = self.pool.begin().await?;

        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews (application_id, candidate_id, job_id, interview_type, format, scheduled_at, duration_minutes, interviewer_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        ))
        .bind(id)
        .bind(application.candidate_id)
        .bind(application.job_id)
        .bind(&details.interview_type)
        .bind(details.format)
        .bind(details.scheduled_at)
        .bind(details.duration_minutes)
        .bind(&details.interviewer_ref)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(next)
        .bind(id)
        .bind(application.status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::Conflict("Application was modified concurrently".to_string())
        })?;

        tx.commit().await?;

        tracing::info!(
            application_id = %id,
            status = %updated.status,
            "Interview scheduled"
        );
        Ok((updated, interview))
    }

    /// How far the candidate may navigate, per the lifecycle contract. An
    /// accepted invitation unlocks the interview step only once the
    /// employer has actually created an interview record. Direct
    /// invitations for the same candidate/job pair count too, since they
    /// carry no `application_id` while the application sits in `accepted`.
    pub async fn accessible_steps(&self, id: Uuid) -> Result<(Application, u8)> {
        let application = self
            .get_application(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {} FROM interviews WHERE candidate_id = $1 AND job_id = $2",
            INTERVIEW_COLUMNS
        ))
        .bind(application.candidate_id)
        .bind(application.job_id)
        .fetch_all(&self.pool)
        .await?;
        let has_interviews = interviews.iter().any(|i| i.counts_toward(&application));
        let steps = application.status.accessible_steps(has_interviews);
        Ok((application, steps))
    }

    /// Shared path for every named operation: re-read the row, resolve the
    /// transition against the table, then update guarded on the status the
    /// decision was made from. A concurrent writer turns into a 409, not a
    /// lost update.
    async fn transition(
        &self,
        id: Uuid,
        op: Transition,
        reason: Option<String>,
    ) -> Result<Application> {
        let application = self
            .get_application(id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        let next = next_status(application.status, op)?;
        let closes = next.is_terminal();

        let updated = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $1,
                updated_at = NOW(),
                closed_reason = CASE WHEN $2 THEN $3 ELSE closed_reason END,
                closed_at = CASE WHEN $2 THEN NOW() ELSE closed_at END
            WHERE id = $4 AND status = $5
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(next)
        .bind(closes)
        .bind(&reason)
        .bind(id)
        .bind(application.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Conflict("Application was modified concurrently".to_string()))?;

        tracing::info!(
            application_id = %id,
            operation = op.as_str(),
            from = application.status.as_str(),
            to = updated.status.as_str(),
            "Application transition applied"
        );
        Ok(updated)
    }
}
