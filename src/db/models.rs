use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Database representation of a job with all fields
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobRow {
    pub id: Uuid,
    pub job_type: String,
    pub description: String,
    pub payment: i64,
    pub deadline: DateTime<Utc>,
    pub location: String,
    pub min_reputation: i32,
    pub job_status: String,
    pub payment_status: String,
    pub payment_transaction_id: Option<String>,
    pub feedback: Option<String>,
    pub requester_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database representation of a user
///
/// `location`, `reputation`, `service_categories` and `availability_status`
/// only carry meaning for providers.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub location: Option<String>,
    pub reputation: i32,
    pub service_categories: Vec<String>,
    pub availability_status: String,
    #[serde(skip_serializing)]
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only notification record
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub job_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Ledger row covering withdrawals, escrow funding and payouts
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub tx_type: String,
    pub description: String,
    pub job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
