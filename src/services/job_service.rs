use crate::error::Result;
use crate::models::job::Job;
use sqlx::PgPool;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, title, company, description, required_skills, location, required_experience_years, relocation_support, created_at, updated_at";

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs ORDER BY created_at DESC",
            JOB_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_job(
        &self,
        title: String,
        company: String,
        description: String,
        required_skills: Vec<String>,
        location: String,
        required_experience_years: i32,
        relocation_support: bool,
    ) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (title, company, description, required_skills, location, required_experience_years, relocation_support)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(title)
        .bind(company)
        .bind(description)
        .bind(required_skills)
        .bind(location)
        .bind(required_experience_years)
        .bind(relocation_support)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }
}
