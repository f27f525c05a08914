pub mod application_dto;
pub mod assistant_dto;
pub mod document_dto;
pub mod interview_dto;
pub mod profile_dto;
