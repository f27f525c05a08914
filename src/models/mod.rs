pub mod application;
pub mod candidate;
pub mod document;
pub mod interview;
pub mod job;
