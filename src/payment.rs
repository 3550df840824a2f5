//! Payment gateway seam.
//!
//! The real system would talk to a UPI/card processor here; this crate
//! ships a simulated gateway with the same contract: asynchronous, with
//! non-deterministic latency, returning a transaction id on success.
//! Callers bound every call with `tokio::time::timeout` and treat expiry
//! as failure.

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;
use std::ops::RangeInclusive;
use tokio::time::{Duration, sleep};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: i64,
    pub currency: String,
    pub description: String,
}

impl PaymentRequest {
    pub fn new(amount: i64, description: String) -> Self {
        Self {
            amount,
            currency: "INR".to_string(),
            description,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug)]
pub struct PaymentError(pub String);

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payment gateway error: {}", self.0)
    }
}

impl std::error::Error for PaymentError {}

/// Narrow contract consumed by the escrow orchestrator
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, PaymentError>;
}

/// Simulated gateway: waits 0.5-1.5s and succeeds with a generated
/// transaction id
pub struct SimulatedGateway {
    latency_ms: RangeInclusive<u64>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self {
            latency_ms: 500..=1500,
        }
    }

    #[cfg(test)]
    pub fn with_latency(latency_ms: RangeInclusive<u64>) -> Self {
        Self { latency_ms }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, PaymentError> {
        let delay = rand::thread_rng().gen_range(self.latency_ms.clone());
        sleep(Duration::from_millis(delay)).await;

        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(char::from)
            .collect();
        let transaction_id = format!(
            "txn_{}_{}",
            chrono::Utc::now().timestamp_millis(),
            suffix.to_lowercase()
        );

        info!(
            "Simulated payment: {} {} for \"{}\", transaction id {}",
            request.amount, request.currency, request.description, transaction_id
        );

        Ok(PaymentReceipt {
            transaction_id,
            amount: request.amount,
            currency: request.currency.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn simulated_payment_succeeds_with_transaction_id() {
        let gateway = SimulatedGateway::with_latency(0..=1);
        let request = PaymentRequest::new(500, "Escrow for job".to_string());

        let receipt = gateway.process_payment(&request).await.unwrap();

        assert!(receipt.transaction_id.starts_with("txn_"));
        assert!(receipt.transaction_id.len() > "txn_".len());
        assert_eq!(receipt.amount, 500);
        assert_eq!(receipt.currency, "INR");
    }

    #[tokio::test]
    async fn distinct_calls_get_distinct_transaction_ids() {
        let gateway = SimulatedGateway::with_latency(0..=1);
        let request = PaymentRequest::new(100, "test".to_string());

        let a = gateway.process_payment(&request).await.unwrap();
        let b = gateway.process_payment(&request).await.unwrap();

        assert_ne!(a.transaction_id, b.transaction_id);
    }

    #[tokio::test]
    async fn slow_gateway_call_can_be_bounded() {
        let gateway = SimulatedGateway::with_latency(200..=200);
        let request = PaymentRequest::new(100, "test".to_string());

        let outcome = timeout(Duration::from_millis(10), gateway.process_payment(&request)).await;

        assert!(outcome.is_err(), "expected the bounded call to time out");
    }
}
