use chrono::Utc;
use relocation_backend::models::application::{
    next_status, Application, ApplicationStatus, Transition,
};
use relocation_backend::models::candidate::Candidate;
use relocation_backend::models::interview::{Interview, InterviewFormat, InterviewStatus};
use relocation_backend::models::job::Job;
use relocation_backend::services::match_service::compute_match_score;
use uuid::Uuid;

fn candidate_with_skills(skills: &[&str]) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        name: "Ravi Kumar".to_string(),
        email: "ravi@example.com".to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        location: "Chennai".to_string(),
        willing_to_relocate: true,
        experience_years: 4,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn job_requiring(skills: &[&str]) -> Job {
    Job {
        id: Uuid::new_v4(),
        title: "Platform Engineer".to_string(),
        company: "Contoso B.V.".to_string(),
        description: "Backend role with relocation to Amsterdam".to_string(),
        required_skills: skills.iter().map(|s| s.to_string()).collect(),
        location: "Amsterdam".to_string(),
        required_experience_years: 3,
        relocation_support: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn invitation_flow_unlocks_steps_only_after_an_interview_exists() {
    // invited: everything beyond the job detail is locked, even if an
    // interview record happens to exist already
    let status = ApplicationStatus::Invited;
    assert_eq!(status.accessible_steps(true), 1);

    // candidate accepts
    let status = next_status(status, Transition::AcceptInvitation).unwrap();
    assert_eq!(status, ApplicationStatus::Accepted);

    // wait state: no interview scheduled yet, still locked
    assert_eq!(status.accessible_steps(false), 1);

    // employer creates the interview: the step opens without any further
    // status change
    assert_eq!(status.accessible_steps(true), 2);
}

#[test]
fn direct_interview_unlocks_the_accepted_wait_state() {
    let application = Application {
        id: Uuid::new_v4(),
        job_id: Uuid::new_v4(),
        candidate_id: Uuid::new_v4(),
        status: ApplicationStatus::Accepted,
        match_score: Some(75),
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
    };
    // the employer issues a direct invitation for the same pair; it has no
    // application_id, and the application's status stays accepted
    let direct = Interview {
        id: Uuid::new_v4(),
        application_id: None,
        candidate_id: application.candidate_id,
        job_id: application.job_id,
        interview_type: "technical".to_string(),
        format: InterviewFormat::Video,
        scheduled_at: Utc::now(),
        duration_minutes: 45,
        status: InterviewStatus::Scheduled,
        interviewer_ref: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let has_interviews = direct.counts_toward(&application);
    assert!(has_interviews);
    assert_eq!(application.status.accessible_steps(has_interviews), 2);
}

#[test]
fn declined_invitation_is_terminal() {
    let status = next_status(ApplicationStatus::Invited, Transition::DeclineInvitation).unwrap();
    assert_eq!(status, ApplicationStatus::Declined);
    assert!(status.is_terminal());
    assert!(next_status(status, Transition::AcceptInvitation).is_err());
    assert_eq!(status.accessible_steps(true), 1);
}

#[test]
fn withdraw_from_applied_succeeds_once() {
    let status = next_status(ApplicationStatus::Applied, Transition::Withdraw).unwrap();
    assert_eq!(status, ApplicationStatus::Withdrawn);
    // a second withdraw hits the terminal-state precondition
    assert!(next_status(status, Transition::Withdraw).is_err());
}

#[test]
fn full_application_journey_to_onboarding() {
    let mut status = ApplicationStatus::Applied;
    let journey = [
        (Transition::BeginReview, ApplicationStatus::Reviewing),
        (Transition::ScheduleInterview, ApplicationStatus::Interviewing),
        (Transition::RecordOffer, ApplicationStatus::OfferReceived),
        (Transition::RecordHire, ApplicationStatus::Hired),
        (Transition::BeginVisaProcessing, ApplicationStatus::VisaProcessing),
        (Transition::BeginOnboarding, ApplicationStatus::Onboarding),
    ];
    for (op, expected) in journey {
        status = next_status(status, op).unwrap();
        assert_eq!(status, expected);
    }
    assert_eq!(status.accessible_steps(true), 6);
}

#[test]
fn two_of_three_skills_scores_between_extremes() {
    let job = job_requiring(&["React", "Node.js", "Docker"]);

    let none = compute_match_score(&candidate_with_skills(&[]), &job).score;
    let partial = compute_match_score(&candidate_with_skills(&["React", "Node.js"]), &job).score;
    let all =
        compute_match_score(&candidate_with_skills(&["React", "Node.js", "Docker"]), &job).score;

    assert!(none < partial && partial < all);
    for score in [none, partial, all] {
        assert!((0..=100).contains(&score));
    }
}

#[test]
fn scorer_is_stable_across_repeated_calls() {
    let job = job_requiring(&["Rust", "Postgres"]);
    let candidate = candidate_with_skills(&["Rust"]);
    let first = compute_match_score(&candidate, &job).score;
    for _ in 0..5 {
        assert_eq!(compute_match_score(&candidate, &job).score, first);
    }
}
