pub mod error;
pub mod health;
pub mod job;
pub mod notification;
pub mod transaction;
pub mod user;
pub mod validation;
