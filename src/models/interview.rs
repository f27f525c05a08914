use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_format", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterviewFormat {
    Video,
    Phone,
    Onsite,
}

/// `application_id` is null for direct interview invitations issued
/// without a prior application; those link candidate and job directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub application_id: Option<Uuid>,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub interview_type: String,
    pub format: InterviewFormat,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: InterviewStatus,
    pub interviewer_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub fn is_direct(&self) -> bool {
        self.application_id.is_none()
    }

    /// Whether this interview unlocks the interview step for the given
    /// application: either linked to it outright, or a direct invitation
    /// for the same candidate/job pair. An employer can issue the direct
    /// invitation while the application sits in `accepted`, so the step
    /// must open without any status change on the application itself.
    pub fn counts_toward(&self, application: &crate::models::application::Application) -> bool {
        match self.application_id {
            Some(linked) => linked == application.id,
            None => {
                self.candidate_id == application.candidate_id && self.job_id == application.job_id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::{Application, ApplicationStatus};

    fn application() -> Application {
        Application {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            status: ApplicationStatus::Accepted,
            match_score: Some(80),
            resume_id: None,
            cover_letter_id: None,
            additional_document_ids: Vec::new(),
            custom_questions: None,
            availability_date: None,
            salary_expectation: None,
            visa_status: None,
            motivation: None,
            closed_reason: None,
            closed_at: None,
            applied_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn interview(application_id: Option<Uuid>, candidate_id: Uuid, job_id: Uuid) -> Interview {
        Interview {
            id: Uuid::new_v4(),
            application_id,
            candidate_id,
            job_id,
            interview_type: "technical".to_string(),
            format: InterviewFormat::Video,
            scheduled_at: Utc::now(),
            duration_minutes: 60,
            status: InterviewStatus::Scheduled,
            interviewer_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn linked_interview_counts_toward_its_application() {
        let app = application();
        let linked = interview(Some(app.id), app.candidate_id, app.job_id);
        assert!(linked.counts_toward(&app));

        let other = interview(Some(Uuid::new_v4()), app.candidate_id, app.job_id);
        assert!(!other.counts_toward(&app));
    }

    #[test]
    fn direct_interview_counts_toward_a_matching_pair() {
        let app = application();
        let direct = interview(None, app.candidate_id, app.job_id);
        assert!(direct.is_direct());
        assert!(direct.counts_toward(&app));
    }

    #[test]
    fn direct_interview_for_another_pair_does_not_count() {
        let app = application();
        let other_job = interview(None, app.candidate_id, Uuid::new_v4());
        assert!(!other_job.counts_toward(&app));
        let other_candidate = interview(None, Uuid::new_v4(), app.job_id);
        assert!(!other_candidate.counts_toward(&app));
    }
}
