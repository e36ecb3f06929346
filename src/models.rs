pub mod ai;
pub mod health;
pub mod question;
pub mod session;
pub mod user;
