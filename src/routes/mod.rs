pub mod application_routes;
pub mod assistant_routes;
pub mod document_routes;
pub mod health;
pub mod interview_routes;
pub mod profile_routes;
