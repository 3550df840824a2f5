use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::db::models::TransactionRow;

/// A ledger entry to record. Rows are immutable once written.
#[derive(Debug)]
pub struct NewTransaction<'a> {
    pub user_id: Uuid,
    pub amount: i64,
    /// One of `credit`, `debit`, `escrow_funding`, `payout`
    pub tx_type: &'a str,
    pub description: String,
    pub job_id: Option<Uuid>,
}

/// Repository for the unified payment ledger
pub struct TransactionRepository;

impl TransactionRepository {
    pub async fn create(
        pool: &Pool<Postgres>,
        tx: &NewTransaction<'_>,
    ) -> Result<TransactionRow, sqlx::Error> {
        sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (id, user_id, amount, tx_type, description, job_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tx.user_id)
        .bind(tx.amount)
        .bind(tx.tx_type)
        .bind(&tx.description)
        .bind(tx.job_id)
        .fetch_one(pool)
        .await
    }

    /// The user's ledger, newest first
    pub async fn list_for_user(
        pool: &Pool<Postgres>,
        user_id: Uuid,
    ) -> Result<Vec<TransactionRow>, sqlx::Error> {
        sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
