use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle state of a job
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Assigned,
    Accepted,
    Completed,
    RevisionRequested,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Assigned => "assigned",
            JobStatus::Accepted => "accepted",
            JobStatus::Completed => "completed",
            JobStatus::RevisionRequested => "revision_requested",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<JobStatus> {
        match s {
            "open" => Some(JobStatus::Open),
            "assigned" => Some(JobStatus::Assigned),
            "accepted" => Some(JobStatus::Accepted),
            "completed" => Some(JobStatus::Completed),
            "revision_requested" => Some(JobStatus::RevisionRequested),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escrow state of a job's payment
///
/// `processing` marks an in-flight gateway call so a job is never funded
/// (or paid out) twice. `released` is set once the approval payout has
/// gone through.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Processing,
    Paid,
    Released,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Released => "released",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "processing" => Some(PaymentStatus::Processing),
            "paid" => Some(PaymentStatus::Paid),
            "released" => Some(PaymentStatus::Released),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for creating a new job
#[derive(Deserialize, Serialize, Debug, Validate)]
pub struct CreateJobRequest {
    #[validate(length(
        min = 2,
        max = 50,
        message = "Job type must be between 2 and 50 characters"
    ))]
    pub job_type: String,

    #[validate(length(
        min = 3,
        max = 2000,
        message = "Description must be between 3 and 2000 characters"
    ))]
    pub description: String,

    #[validate(range(min = 1, message = "Payment must be a positive amount"))]
    pub payment: i64,

    pub deadline: DateTime<Utc>,

    #[validate(length(min = 2, max = 100, message = "Work location is required"))]
    pub location: String,

    #[validate(range(min = 0, message = "Minimum reputation cannot be negative"))]
    #[serde(default)]
    pub min_reputation: i32,
}

/// Payload for a requester assigning a specific worker
#[derive(Deserialize, Debug, Validate)]
pub struct AssignWorkerRequest {
    pub worker_id: Uuid,
}

/// Payload for a revision request
#[derive(Deserialize, Debug, Validate)]
pub struct RevisionRequest {
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Feedback is required for a revision request"
    ))]
    pub feedback: String,
}

/// Query parameters for listing the caller's jobs
#[derive(Deserialize, Debug)]
pub struct MyJobsQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            JobStatus::Open,
            JobStatus::Assigned,
            JobStatus::Accepted,
            JobStatus::Completed,
            JobStatus::RevisionRequested,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("approved"), None);
    }

    #[test]
    fn payment_status_round_trips_through_strings() {
        for status in [
            PaymentStatus::Unpaid,
            PaymentStatus::Processing,
            PaymentStatus::Paid,
            PaymentStatus::Released,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse(""), None);
    }

    #[test]
    fn create_job_request_rejects_non_positive_payment() {
        let req = CreateJobRequest {
            job_type: "plumbing".to_string(),
            description: "Fix the kitchen sink".to_string(),
            payment: 0,
            deadline: Utc::now(),
            location: "Pune".to_string(),
            min_reputation: 0,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_job_request_accepts_valid_payload() {
        let req = CreateJobRequest {
            job_type: "plumbing".to_string(),
            description: "Fix the kitchen sink".to_string(),
            payment: 500,
            deadline: Utc::now(),
            location: "Pune".to_string(),
            min_reputation: 0,
        };
        assert!(req.validate().is_ok());
    }
}
