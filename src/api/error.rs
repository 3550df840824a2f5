use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use tracing::{error, warn};

use crate::api::job::models::JobStatus;
use crate::api::validation::ErrorResponse;

/// Service-level errors shared across resources
#[derive(Debug)]
pub enum ServiceError {
    /// Store unreachable or query failed; distinct from business failures
    Database(sqlx::Error),

    /// Input failed a business-level check
    Validation(String),

    /// No matching record under the caller's ownership scope. Doubles as
    /// the authorization failure for actor-scoped operations so existence
    /// is never leaked.
    NotFound(&'static str),

    /// Caller's role does not permit the operation
    Forbidden(&'static str),

    /// The job's current status does not permit the requested lifecycle
    /// operation
    InvalidTransition {
        action: &'static str,
        status: JobStatus,
    },

    /// Payment gateway reported failure, timed out, or the escrow is not
    /// in the state the money movement requires
    PaymentFailed(String),

    /// A stored invariant does not hold; reported with a generic message
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Database(e) => write!(f, "Database error: {}", e),
            ServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::NotFound(what) => write!(f, "{} not found", what),
            ServiceError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ServiceError::InvalidTransition { action, status } => {
                write!(f, "Cannot {} a job in status '{}'", action, status)
            }
            ServiceError::PaymentFailed(msg) => write!(f, "Payment failed: {}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Database(e)
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Database(e) => {
                error!("Database error: {}", e);
                HttpResponse::ServiceUnavailable().json(ErrorResponse {
                    error: "Service unavailable".to_string(),
                    fields: serde_json::json!({"message": "A dependency is unavailable, try again later"}),
                })
            }
            ServiceError::Validation(msg) => {
                warn!("Validation error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::NotFound(what) => {
                warn!("{} not found", what);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("{} not found", what)}),
                })
            }
            ServiceError::Forbidden(msg) => {
                warn!("Forbidden: {}", msg);
                HttpResponse::Forbidden().json(ErrorResponse {
                    error: "Forbidden".to_string(),
                    fields: serde_json::json!({"message": *msg}),
                })
            }
            ServiceError::InvalidTransition { action, status } => {
                warn!("Invalid transition: {} from '{}'", action, status);
                HttpResponse::Conflict().json(ErrorResponse {
                    error: "Invalid transition".to_string(),
                    fields: serde_json::json!({
                        "message": format!("Cannot {} a job in status '{}'", action, status),
                        "status": status.as_str(),
                    }),
                })
            }
            ServiceError::PaymentFailed(msg) => {
                warn!("Payment failed: {}", msg);
                HttpResponse::PaymentRequired().json(ErrorResponse {
                    error: "Payment failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::Internal(msg) => {
                error!("Internal error: {}", msg);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Internal error".to_string(),
                    fields: serde_json::json!({"message": "Something went wrong"}),
                })
            }
        }
    }
}
