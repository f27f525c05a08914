use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Closed application lifecycle status. Stored as a Postgres enum; every
/// change goes through `next_status` so illegal transitions never reach
/// the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Invited,
    Accepted,
    Declined,
    Applied,
    Reviewing,
    Interviewing,
    OfferReceived,
    Hired,
    VisaProcessing,
    Onboarding,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Invited => "invited",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Declined => "declined",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::OfferReceived => "offer_received",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::VisaProcessing => "visa_processing",
            ApplicationStatus::Onboarding => "onboarding",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Declined
                | ApplicationStatus::Rejected
                | ApplicationStatus::Withdrawn
        )
    }

    /// Number of lifecycle steps a candidate can navigate to for this
    /// status. `has_interviews` only matters in the accepted wait state:
    /// an accepted invitation stays locked until the employer schedules
    /// the first interview.
    pub fn accessible_steps(&self, has_interviews: bool) -> u8 {
        match self {
            ApplicationStatus::Applied | ApplicationStatus::Reviewing => 1,
            ApplicationStatus::Invited => 1,
            ApplicationStatus::Accepted => {
                if has_interviews {
                    2
                } else {
                    1
                }
            }
            ApplicationStatus::Interviewing => 2,
            ApplicationStatus::Hired => 3,
            ApplicationStatus::OfferReceived => 4,
            ApplicationStatus::VisaProcessing => 5,
            ApplicationStatus::Onboarding => 6,
            ApplicationStatus::Declined
            | ApplicationStatus::Rejected
            | ApplicationStatus::Withdrawn => 1,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named lifecycle operations. The status column is never set directly;
/// services resolve an operation against the current status via
/// `next_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    AcceptInvitation,
    DeclineInvitation,
    BeginReview,
    ScheduleInterview,
    RecordOffer,
    RecordHire,
    RecordRejection,
    Withdraw,
    BeginVisaProcessing,
    BeginOnboarding,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::AcceptInvitation => "accept_invitation",
            Transition::DeclineInvitation => "decline_invitation",
            Transition::BeginReview => "begin_review",
            Transition::ScheduleInterview => "schedule_interview",
            Transition::RecordOffer => "record_offer",
            Transition::RecordHire => "record_hire",
            Transition::RecordRejection => "record_rejection",
            Transition::Withdraw => "withdraw",
            Transition::BeginVisaProcessing => "begin_visa_processing",
            Transition::BeginOnboarding => "begin_onboarding",
        }
    }
}

/// The transition table. Returns the resulting status, or `Conflict` when
/// the operation is not legal from the current status. Withdrawal is only
/// offered before interviewing begins; rejection is only possible while
/// the application is still in the employer's hands.
pub fn next_status(current: ApplicationStatus, op: Transition) -> Result<ApplicationStatus> {
    use ApplicationStatus as S;
    use Transition as T;

    let next = match (current, op) {
        (S::Invited, T::AcceptInvitation) => S::Accepted,
        (S::Invited, T::DeclineInvitation) => S::Declined,
        (S::Applied, T::BeginReview) => S::Reviewing,
        (S::Accepted | S::Reviewing, T::ScheduleInterview) => S::Interviewing,
        // Additional rounds while already interviewing keep the status.
        (S::Interviewing, T::ScheduleInterview) => S::Interviewing,
        (S::Interviewing, T::RecordOffer) => S::OfferReceived,
        (S::OfferReceived, T::RecordHire) => S::Hired,
        (S::Applied | S::Reviewing | S::Interviewing, T::RecordRejection) => S::Rejected,
        (S::Applied | S::Reviewing, T::Withdraw) => S::Withdrawn,
        (S::Hired, T::BeginVisaProcessing) => S::VisaProcessing,
        (S::VisaProcessing, T::BeginOnboarding) => S::Onboarding,
        (current, op) => {
            return Err(Error::Conflict(format!(
                "Operation {} is not allowed while the application is {}",
                op.as_str(),
                current.as_str()
            )))
        }
    };
    Ok(next)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub status: ApplicationStatus,
    pub match_score: Option<i32>,
    pub resume_id: Option<Uuid>,
    pub cover_letter_id: Option<Uuid>,
    pub additional_document_ids: Vec<Uuid>,
    pub custom_questions: Option<JsonValue>,
    pub availability_date: Option<NaiveDate>,
    pub salary_expectation: Option<Decimal>,
    pub visa_status: Option<String>,
    pub motivation: Option<String>,
    pub closed_reason: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus as S;
    use Transition as T;

    #[test]
    fn forward_lifecycle_is_reachable_step_by_step() {
        let mut status = S::Applied;
        for op in [
            T::BeginReview,
            T::ScheduleInterview,
            T::RecordOffer,
            T::RecordHire,
            T::BeginVisaProcessing,
            T::BeginOnboarding,
        ] {
            status = next_status(status, op).expect("forward transition");
        }
        assert_eq!(status, S::Onboarding);
    }

    #[test]
    fn withdraw_succeeds_once_then_fails_on_terminal() {
        let status = next_status(S::Applied, T::Withdraw).unwrap();
        assert_eq!(status, S::Withdrawn);
        assert!(status.is_terminal());
        assert!(next_status(status, T::Withdraw).is_err());
    }

    #[test]
    fn withdraw_is_not_offered_once_interviewing() {
        assert!(next_status(S::Interviewing, T::Withdraw).is_err());
        assert!(next_status(S::OfferReceived, T::Withdraw).is_err());
    }

    #[test]
    fn rejection_only_before_offer() {
        for s in [S::Applied, S::Reviewing, S::Interviewing] {
            assert_eq!(next_status(s, T::RecordRejection).unwrap(), S::Rejected);
        }
        assert!(next_status(S::OfferReceived, T::RecordRejection).is_err());
        assert!(next_status(S::Hired, T::RecordRejection).is_err());
    }

    #[test]
    fn terminal_states_admit_no_operations() {
        for s in [S::Declined, S::Rejected, S::Withdrawn] {
            for op in [
                T::AcceptInvitation,
                T::DeclineInvitation,
                T::BeginReview,
                T::ScheduleInterview,
                T::RecordOffer,
                T::RecordHire,
                T::RecordRejection,
                T::Withdraw,
                T::BeginVisaProcessing,
                T::BeginOnboarding,
            ] {
                assert!(next_status(s, op).is_err(), "{} from {}", op.as_str(), s);
            }
        }
    }

    #[test]
    fn intermediate_states_cannot_be_skipped() {
        // applied must pass through reviewing before an interview
        assert!(next_status(S::Applied, T::ScheduleInterview).is_err());
        // an invitation must be accepted first
        assert!(next_status(S::Invited, T::ScheduleInterview).is_err());
        // no hire without an offer
        assert!(next_status(S::Interviewing, T::RecordHire).is_err());
    }

    #[test]
    fn invited_stays_locked_even_with_interviews_present() {
        assert_eq!(S::Invited.accessible_steps(true), 1);
        assert_eq!(S::Invited.accessible_steps(false), 1);
    }

    #[test]
    fn accepted_waits_for_first_interview() {
        assert_eq!(S::Accepted.accessible_steps(false), 1);
        assert_eq!(S::Accepted.accessible_steps(true), 2);
    }

    #[test]
    fn step_counts_match_contract() {
        assert_eq!(S::Applied.accessible_steps(false), 1);
        assert_eq!(S::Reviewing.accessible_steps(true), 1);
        assert_eq!(S::Interviewing.accessible_steps(true), 2);
        assert_eq!(S::Hired.accessible_steps(true), 3);
        assert_eq!(S::OfferReceived.accessible_steps(true), 4);
        assert_eq!(S::VisaProcessing.accessible_steps(true), 5);
        assert_eq!(S::Onboarding.accessible_steps(true), 6);
        assert_eq!(S::Rejected.accessible_steps(true), 1);
        assert_eq!(S::Declined.accessible_steps(true), 1);
        assert_eq!(S::Withdrawn.accessible_steps(true), 1);
    }
}
