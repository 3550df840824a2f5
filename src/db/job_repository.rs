use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::api::job::models::CreateJobRequest;
use crate::db::models::JobRow;

/// Repository for Job database operations.
///
/// Every lifecycle mutation is a single conditional UPDATE whose WHERE
/// clause carries both the ownership scope and the expected current status.
/// A concurrent writer that loses the race sees `None` instead of
/// overwriting the winner's state.
pub struct JobRepository;

impl JobRepository {
    /// Create a new job in status `open`/`unpaid` owned by `requester_id`
    pub async fn create(
        pool: &Pool<Postgres>,
        req: &CreateJobRequest,
        requester_id: Uuid,
    ) -> Result<JobRow, sqlx::Error> {
        debug!("Creating job: type={}, location={}", req.job_type, req.location);

        sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (id, job_type, description, payment, deadline, location,
                 min_reputation, job_status, payment_status, requester_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'open', 'unpaid', $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&req.job_type)
        .bind(&req.description)
        .bind(req.payment)
        .bind(req.deadline)
        .bind(&req.location)
        .bind(req.min_reputation)
        .bind(requester_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &Pool<Postgres>,
        id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Scoped fetch: only returns the job if `requester_id` owns it
    pub async fn find_for_requester(
        pool: &Pool<Postgres>,
        id: Uuid,
        requester_id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND requester_id = $2")
            .bind(id)
            .bind(requester_id)
            .fetch_optional(pool)
            .await
    }

    /// Scoped fetch: only returns the job if `provider_id` is assigned to it
    pub async fn find_for_provider(
        pool: &Pool<Postgres>,
        id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND provider_id = $2")
            .bind(id)
            .bind(provider_id)
            .fetch_optional(pool)
            .await
    }

    /// Open jobs a provider is eligible for: matching location, reputation
    /// threshold met, job type within their service categories
    pub async fn list_available(
        pool: &Pool<Postgres>,
        location: &str,
        reputation: i32,
        service_categories: &[String],
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE job_status = 'open'
              AND location = $1
              AND min_reputation <= $2
              AND job_type = ANY($3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(location)
        .bind(reputation)
        .bind(service_categories)
        .fetch_all(pool)
        .await
    }

    /// Jobs the user is party to, either side, newest first
    pub async fn list_for_user(
        pool: &Pool<Postgres>,
        user_id: Uuid,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE (requester_id = $1 OR provider_id = $1)
              AND ($2::text IS NULL OR job_status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Requester assigns a specific worker to an open job
    pub async fn assign(
        pool: &Pool<Postgres>,
        id: Uuid,
        requester_id: Uuid,
        worker_id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET provider_id = $3, job_status = 'assigned', updated_at = now()
            WHERE id = $1 AND requester_id = $2 AND job_status = 'open'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(requester_id)
        .bind(worker_id)
        .fetch_optional(pool)
        .await
    }

    /// Provider claims an open job, or confirms one already assigned to
    /// them. First writer wins; the loser gets `None`.
    pub async fn accept(
        pool: &Pool<Postgres>,
        id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET provider_id = $2, job_status = 'accepted', updated_at = now()
            WHERE id = $1
              AND (job_status = 'open'
                   OR (job_status = 'assigned' AND provider_id = $2))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .fetch_optional(pool)
        .await
    }

    /// Assigned provider steps away; the job reopens
    pub async fn unassign(
        pool: &Pool<Postgres>,
        id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET provider_id = NULL, job_status = 'open', updated_at = now()
            WHERE id = $1 AND provider_id = $2 AND job_status = 'assigned'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .fetch_optional(pool)
        .await
    }

    /// Provider marks the work done, from `accepted` or after a revision
    pub async fn complete(
        pool: &Pool<Postgres>,
        id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET job_status = 'completed', updated_at = now()
            WHERE id = $1 AND provider_id = $2
              AND job_status IN ('accepted', 'revision_requested')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .fetch_optional(pool)
        .await
    }

    /// Requester sends completed work back with feedback
    pub async fn request_revision(
        pool: &Pool<Postgres>,
        id: Uuid,
        requester_id: Uuid,
        feedback: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET job_status = 'revision_requested', feedback = $3, updated_at = now()
            WHERE id = $1 AND requester_id = $2
              AND job_status IN ('completed', 'revision_requested')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(requester_id)
        .bind(feedback)
        .fetch_optional(pool)
        .await
    }

    /// Requester cancels; terminal, provider assignment is retained for
    /// the cancellation notification
    pub async fn cancel(
        pool: &Pool<Postgres>,
        id: Uuid,
        requester_id: Uuid,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET job_status = 'cancelled', updated_at = now()
            WHERE id = $1 AND requester_id = $2
              AND job_status IN ('open', 'assigned', 'accepted', 'revision_requested')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(requester_id)
        .fetch_optional(pool)
        .await
    }

    /// Atomically claim a payment movement by flipping payment_status to
    /// `processing`. Exactly one caller wins the claim, so the gateway is
    /// never invoked twice for the same movement.
    pub async fn begin_payment(
        pool: &Pool<Postgres>,
        id: Uuid,
        requester_id: Uuid,
        expected_job_status: &str,
        expected_payment_status: &str,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET payment_status = 'processing', updated_at = now()
            WHERE id = $1 AND requester_id = $2
              AND job_status = $3 AND payment_status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(requester_id)
        .bind(expected_job_status)
        .bind(expected_payment_status)
        .fetch_optional(pool)
        .await
    }

    /// Resolve an in-flight payment claim, forward to the new status on
    /// gateway success or back to the previous one on failure
    pub async fn settle_payment(
        pool: &Pool<Postgres>,
        id: Uuid,
        new_payment_status: &str,
        transaction_id: Option<&str>,
    ) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs
            SET payment_status = $2,
                payment_transaction_id = COALESCE($3, payment_transaction_id),
                updated_at = now()
            WHERE id = $1 AND payment_status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_payment_status)
        .bind(transaction_id)
        .fetch_optional(pool)
        .await
    }
}
