pub mod auth;
pub mod voter;
