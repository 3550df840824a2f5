pub mod connection;
pub mod job_repository;
pub mod migrations;
pub mod models;
pub mod notification_repository;
pub mod transaction_repository;
pub mod user_repository;
