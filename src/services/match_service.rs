use crate::error::{Error, Result};
use crate::models::{candidate::Candidate, job::Job};
use crate::services::{candidate_service::CandidateService, job_service::JobService};
use serde::Serialize;
use uuid::Uuid;

/// Skill overlap carries the dominant share of the score; the remainder is
/// split between relocation/location fit and experience.
pub const SKILL_WEIGHT: i64 = 60;
pub const LOCATION_WEIGHT: i64 = 20;
pub const EXPERIENCE_WEIGHT: i64 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct MatchBreakdown {
    pub score: i32,
    pub skill_points: i32,
    pub location_points: i32,
    pub experience_points: i32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

fn normalize(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// Deterministic 0-100 compatibility score. Monotonic in matched skills:
/// adding a matching skill never lowers the result. A job with no listed
/// requirements grants the full skill share, since there is nothing to
/// miss.
pub fn compute_match_score(candidate: &Candidate, job: &Job) -> MatchBreakdown {
    let candidate_skills: std::collections::HashSet<String> =
        candidate.skills.iter().map(|s| normalize(s)).collect();

    let mut matched_skills = Vec::new();
    let mut missing_skills = Vec::new();
    for required in &job.required_skills {
        if candidate_skills.contains(&normalize(required)) {
            matched_skills.push(required.clone());
        } else {
            missing_skills.push(required.clone());
        }
    }

    let required_count = job.required_skills.len() as i64;
    let skill_points = if required_count == 0 {
        SKILL_WEIGHT
    } else {
        matched_skills.len() as i64 * SKILL_WEIGHT / required_count
    };

    let same_location = !job.location.is_empty()
        && job.location.eq_ignore_ascii_case(&candidate.location);
    let location_points = if same_location {
        LOCATION_WEIGHT
    } else if candidate.willing_to_relocate && job.relocation_support {
        LOCATION_WEIGHT
    } else if candidate.willing_to_relocate {
        LOCATION_WEIGHT / 2
    } else {
        0
    };

    let required_years = job.required_experience_years as i64;
    let experience_points = if required_years <= 0 {
        EXPERIENCE_WEIGHT
    } else {
        (candidate.experience_years as i64 * EXPERIENCE_WEIGHT / required_years)
            .min(EXPERIENCE_WEIGHT)
            .max(0)
    };

    let score = (skill_points + location_points + experience_points).clamp(0, 100) as i32;

    MatchBreakdown {
        score,
        skill_points: skill_points as i32,
        location_points: location_points as i32,
        experience_points: experience_points as i32,
        matched_skills,
        missing_skills,
    }
}

#[derive(Clone)]
pub struct MatchService {
    candidate_service: CandidateService,
    job_service: JobService,
}

impl MatchService {
    pub fn new(candidate_service: CandidateService, job_service: JobService) -> Self {
        Self {
            candidate_service,
            job_service,
        }
    }

    pub async fn score(&self, candidate_id: Uuid, job_id: Uuid) -> Result<MatchBreakdown> {
        let candidate = self
            .candidate_service
            .get_candidate(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        let job = self
            .job_service
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        Ok(compute_match_score(&candidate, &job))
    }
}
