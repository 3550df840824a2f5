//! Notification dispatch.
//!
//! Every lifecycle event persists a notification row and then attempts a
//! best-effort push. Neither step ever fails the lifecycle operation that
//! triggered it: failures are logged and swallowed.

use futures_util::future::join_all;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::JobRow;
use crate::db::notification_repository::NotificationRepository;
use crate::db::user_repository::UserRepository;

/// Outcome of a push delivery attempt
#[derive(Debug)]
pub struct PushOutcome {
    pub success: bool,
    pub detail: String,
}

/// Process-wide push delivery capability, constructed once at startup and
/// injected into the dispatcher. When disabled (no credentials configured)
/// every send is skipped; notification rows are still written.
pub struct PushClient {
    enabled: bool,
}

impl PushClient {
    pub fn from_config(enabled: bool) -> Self {
        if enabled {
            info!("Push delivery enabled");
        } else {
            warn!("Push delivery disabled; notifications will only be persisted");
        }
        Self { enabled }
    }

    /// Deliver a push message to a device token. Never returns an error;
    /// the outcome says whether delivery happened.
    pub async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> PushOutcome {
        if !self.enabled {
            return PushOutcome {
                success: false,
                detail: "push delivery disabled".to_string(),
            };
        }
        if token.is_empty() {
            return PushOutcome {
                success: false,
                detail: "no device token".to_string(),
            };
        }

        // Simulated delivery; a real client would call FCM/APNs here
        info!("Push to {}: {} - {} ({})", token, title, body, data);
        PushOutcome {
            success: true,
            detail: "delivered".to_string(),
        }
    }
}

/// Issues notification and push side effects for lifecycle events
#[derive(Clone)]
pub struct Dispatcher {
    pool: Pool<Postgres>,
    push: Arc<PushClient>,
}

impl Dispatcher {
    pub fn new(pool: Pool<Postgres>, push: Arc<PushClient>) -> Self {
        Self { pool, push }
    }

    /// Persist a notification for `user_id`, then best-effort push.
    /// Never propagates failure to the caller.
    pub async fn notify(&self, user_id: Uuid, message: &str, job_id: Option<Uuid>) {
        match NotificationRepository::create(&self.pool, user_id, message, job_id).await {
            Ok(_) => info!("Notification created for user {}: \"{}\"", user_id, message),
            Err(e) => {
                warn!("Failed to create notification for user {}: {}", user_id, e);
                return;
            }
        }

        let token = match UserRepository::find_by_id(&self.pool, user_id).await {
            Ok(Some(user)) => user.push_token,
            Ok(None) => None,
            Err(e) => {
                warn!("Push token lookup failed for user {}: {}", user_id, e);
                None
            }
        };

        if let Some(token) = token {
            let data = match job_id {
                Some(id) => serde_json::json!({ "job_id": id }),
                None => serde_json::json!({}),
            };
            let outcome = self.push.send(&token, "GigMarket", message, data).await;
            if !outcome.success {
                warn!("Push delivery skipped for user {}: {}", user_id, outcome.detail);
            }
        }
    }

    /// Announce a freshly created job to every strictly-matching provider.
    /// Fan-out is concurrent and per-recipient failures are isolated.
    pub async fn announce_job(&self, job: &JobRow) {
        let providers = match UserRepository::find_matching_providers(
            &self.pool,
            &job.location,
            job.min_reputation,
            &job.job_type,
        )
        .await
        {
            Ok(providers) => providers,
            Err(e) => {
                warn!("Provider matching failed for job {}: {}", job.id, e);
                return;
            }
        };

        info!(
            "Announcing job {} to {} matching provider(s)",
            job.id,
            providers.len()
        );

        let message = format!(
            "A new '{}' job is available in {}.",
            job.job_type, job.location
        );
        join_all(
            providers
                .iter()
                .map(|p| self.notify(p.id, &message, Some(job.id))),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_push_client_skips_delivery() {
        let client = PushClient::from_config(false);
        let outcome = client
            .send("device-token", "GigMarket", "hello", serde_json::json!({}))
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.detail, "push delivery disabled");
    }

    #[tokio::test]
    async fn enabled_push_client_requires_a_token() {
        let client = PushClient::from_config(true);
        let outcome = client
            .send("", "GigMarket", "hello", serde_json::json!({}))
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.detail, "no device token");
    }

    #[tokio::test]
    async fn enabled_push_client_delivers() {
        let client = PushClient::from_config(true);
        let outcome = client
            .send(
                "device-token",
                "GigMarket",
                "hello",
                serde_json::json!({"job_id": "abc"}),
            )
            .await;

        assert!(outcome.success);
    }
}
