pub mod postgres_repository;
pub mod question;
pub mod session;
pub mod user;
