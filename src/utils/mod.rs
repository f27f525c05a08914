pub mod cache;
pub mod signing;
pub mod time;
