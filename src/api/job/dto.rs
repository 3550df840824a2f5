use serde::Serialize;

use crate::db::models::JobRow;

/// Response for a single job operation
#[derive(Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: JobRow,
}

/// Response for job listings
#[derive(Serialize)]
pub struct JobListResponse {
    pub results: usize,
    pub jobs: Vec<JobRow>,
}

/// Response for operations that do not return a job (e.g. rejection)
#[derive(Serialize)]
pub struct AckResponse {
    pub message: String,
}
