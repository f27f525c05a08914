use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub location: String,
    pub willing_to_relocate: bool,
    pub experience_years: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
