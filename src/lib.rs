pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

use crate::services::{
    application_service::ApplicationService, assistant_service::AssistantService,
    candidate_service::CandidateService, document_service::DocumentService,
    document_service::PgDocumentStore, interview_service::InterviewService,
    job_service::JobService, match_service::MatchService,
};
use crate::storage::local::LocalStorage;
use crate::utils::cache::OwnerCache;
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub application_service: ApplicationService,
    pub candidate_service: CandidateService,
    pub job_service: JobService,
    pub match_service: MatchService,
    pub interview_service: InterviewService,
    pub document_service: DocumentService,
    pub assistant_service: AssistantService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client construction cannot fail with these options");

        let profile_cache = OwnerCache::new(Duration::from_secs(config.profile_cache_ttl_secs));

        let candidate_service = CandidateService::new(pool.clone(), profile_cache);
        let job_service = JobService::new(pool.clone());
        let match_service = MatchService::new(candidate_service.clone(), job_service.clone());
        let application_service = ApplicationService::new(pool.clone());
        let interview_service = InterviewService::new(pool.clone());

        let storage = Arc::new(LocalStorage::new(config.uploads_dir.clone()));
        let store = Arc::new(PgDocumentStore::new(pool.clone()));
        let document_service = DocumentService::new(store, storage);

        let assistant_service = AssistantService::new(
            config.assistant_api_key.clone(),
            config.assistant_api_url.clone(),
            http_client,
        );

        Self {
            pool,
            application_service,
            candidate_service,
            job_service,
            match_service,
            interview_service,
            document_service,
            assistant_service,
        }
    }
}
