pub mod ai;
pub mod auth;
pub mod question;
pub mod session;
