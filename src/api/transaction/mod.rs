use actix_web::{
    HttpResponse, get, post,
    web::{Data, ServiceConfig, scope},
};
use actix_web_validator::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use tracing::info;
use validator::Validate;

use crate::api::error::ServiceError;
use crate::auth::{AuthUser, Role};
use crate::db::models::TransactionRow;
use crate::db::transaction_repository::{NewTransaction, TransactionRepository};

#[derive(Deserialize, Debug, Validate)]
struct WithdrawRequest {
    #[validate(range(min = 1, message = "Withdrawal amount must be positive"))]
    amount: i64,
}

#[derive(Serialize)]
struct TransactionListResponse {
    results: usize,
    transactions: Vec<TransactionRow>,
}

#[derive(Serialize)]
struct TransactionResponse {
    message: String,
    transaction: TransactionRow,
}

#[get("")]
async fn my_transactions(
    pool: Data<Pool<Postgres>>,
    user: AuthUser,
) -> Result<HttpResponse, ServiceError> {
    let transactions = TransactionRepository::list_for_user(&pool, user.id).await?;
    Ok(HttpResponse::Ok().json(TransactionListResponse {
        results: transactions.len(),
        transactions,
    }))
}

/// Simulated withdrawal: records a debit ledger row, no real transfer
#[post("/withdraw")]
async fn withdraw_funds(
    pool: Data<Pool<Postgres>>,
    user: AuthUser,
    body: Json<WithdrawRequest>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Provider)?;

    let transaction = TransactionRepository::create(
        &pool,
        &NewTransaction {
            user_id: user.id,
            amount: body.amount,
            tx_type: "debit",
            description: "Withdrawal to bank account".to_string(),
            job_id: None,
        },
    )
    .await?;

    info!("Withdrawal of {} recorded for user {}", body.amount, user.id);

    Ok(HttpResponse::Ok().json(TransactionResponse {
        message: "Withdrawal processed successfully".to_string(),
        transaction,
    }))
}

pub fn transaction_config(config: &mut ServiceConfig) {
    config.service(
        scope("transactions")
            .service(my_transactions)
            .service(withdraw_funds),
    );
}
