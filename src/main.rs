use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use relocation_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::rate_limit::{rps_middleware, RateLimiter},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let api = Router::new()
        .route(
            "/api/candidates",
            post(routes::profile_routes::create_candidate),
        )
        .route(
            "/api/candidates/:id",
            get(routes::profile_routes::get_candidate)
                .patch(routes::profile_routes::update_candidate),
        )
        .route(
            "/api/candidates/:id/applications",
            get(routes::application_routes::list_candidate_applications),
        )
        .route(
            "/api/candidates/:id/documents",
            get(routes::document_routes::list_owner_documents),
        )
        .route(
            "/api/jobs",
            get(routes::profile_routes::list_jobs).post(routes::profile_routes::create_job),
        )
        .route("/api/jobs/:id", get(routes::profile_routes::get_job))
        .route(
            "/api/jobs/:job_id/match/:candidate_id",
            get(routes::profile_routes::get_match),
        )
        .route(
            "/api/applications",
            post(routes::application_routes::apply),
        )
        .route(
            "/api/invitations",
            post(routes::application_routes::invite),
        )
        .route(
            "/api/applications/:id",
            get(routes::application_routes::get_application),
        )
        .route(
            "/api/applications/:id/steps",
            get(routes::application_routes::get_steps),
        )
        .route(
            "/api/applications/:id/accept",
            post(routes::application_routes::accept_invitation),
        )
        .route(
            "/api/applications/:id/decline",
            post(routes::application_routes::decline_invitation),
        )
        .route(
            "/api/applications/:id/review",
            post(routes::application_routes::begin_review),
        )
        .route(
            "/api/applications/:id/withdraw",
            post(routes::application_routes::withdraw),
        )
        .route(
            "/api/applications/:id/interviews",
            get(routes::interview_routes::list_application_interviews)
                .post(routes::application_routes::schedule_interview),
        )
        .route(
            "/api/applications/:id/offer",
            post(routes::application_routes::record_offer),
        )
        .route(
            "/api/applications/:id/hire",
            post(routes::application_routes::record_hire),
        )
        .route(
            "/api/applications/:id/reject",
            post(routes::application_routes::record_rejection),
        )
        .route(
            "/api/applications/:id/visa-processing",
            post(routes::application_routes::begin_visa_processing),
        )
        .route(
            "/api/applications/:id/onboarding",
            post(routes::application_routes::begin_onboarding),
        )
        .route(
            "/api/interviews/direct",
            post(routes::interview_routes::create_direct_interview),
        )
        .route(
            "/api/interviews/:id",
            get(routes::interview_routes::get_interview),
        )
        .route(
            "/api/documents",
            post(routes::document_routes::upload_document),
        )
        .route(
            "/api/documents/:id",
            get(routes::document_routes::get_document)
                .patch(routes::document_routes::update_document_metadata)
                .delete(routes::document_routes::delete_document),
        )
        .route(
            "/api/documents/:id/download",
            get(routes::document_routes::download_document),
        )
        .route(
            "/api/documents/:id/verify",
            post(routes::document_routes::verify_document),
        )
        .route("/api/assistant/chat", post(routes::assistant_routes::chat))
        .route(
            "/api/assistant/chat/stream",
            post(routes::assistant_routes::chat_stream),
        )
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::per_second(config.public_rps),
            rps_middleware,
        ));

    let app = base_routes
        .merge(api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
