pub mod dto;
pub mod handlers;
pub mod models;
pub mod service;
pub mod transitions;

// Re-export commonly used types
pub use service::JobService;
