use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCandidatePayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_true")]
    pub willing_to_relocate: bool,
    #[validate(range(min = 0, max = 60))]
    #[serde(default)]
    pub experience_years: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCandidatePayload {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_true")]
    pub willing_to_relocate: bool,
    #[validate(range(min = 0, max = 60))]
    #[serde(default)]
    pub experience_years: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[validate(range(min = 0, max = 60))]
    #[serde(default)]
    pub required_experience_years: i32,
    #[serde(default)]
    pub relocation_support: bool,
}

fn default_true() -> bool {
    true
}
