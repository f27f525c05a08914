use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub location: String,
    pub required_experience_years: i32,
    pub relocation_support: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
