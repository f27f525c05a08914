use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::utils::cache::OwnerCache;
use sqlx::PgPool;
use uuid::Uuid;

const CANDIDATE_COLUMNS: &str =
    "id, name, email, skills, location, willing_to_relocate, experience_years, created_at, updated_at";

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
    profile_cache: OwnerCache<Candidate>,
}

impl CandidateService {
    pub fn new(pool: PgPool, profile_cache: OwnerCache<Candidate>) -> Self {
        Self {
            pool,
            profile_cache,
        }
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        if let Some(cached) = self.profile_cache.get(id) {
            return Ok(Some(cached));
        }
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {} FROM candidates WHERE id = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(ref c) = candidate {
            self.profile_cache.insert(id, c.clone());
        }
        Ok(candidate)
    }

    pub async fn create_candidate(
        &self,
        name: String,
        email: String,
        skills: Vec<String>,
        location: String,
        willing_to_relocate: bool,
        experience_years: i32,
    ) -> Result<Candidate> {
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM candidates WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(Error::Conflict(
                "A candidate with this email address already exists".to_string(),
            ));
        }

        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            INSERT INTO candidates (name, email, skills, location, willing_to_relocate, experience_years)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(skills)
        .bind(location)
        .bind(willing_to_relocate)
        .bind(experience_years)
        .fetch_one(&self.pool)
        .await?;
        Ok(candidate)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        skills: Vec<String>,
        location: String,
        willing_to_relocate: bool,
        experience_years: i32,
    ) -> Result<Candidate> {
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            UPDATE candidates
            SET skills = $1, location = $2, willing_to_relocate = $3,
                experience_years = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        ))
        .bind(skills)
        .bind(location)
        .bind(willing_to_relocate)
        .bind(experience_years)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        // Cached profile is stale now.
        self.profile_cache.purge(id);
        Ok(candidate)
    }
}
