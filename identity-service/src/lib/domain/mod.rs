pub mod auth;
pub mod errors;
pub mod session;
pub mod user;
