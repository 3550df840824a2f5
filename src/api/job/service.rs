use chrono::Utc;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use tokio::time::{Duration, timeout};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::models::{CreateJobRequest, JobStatus, MyJobsQuery};
use super::transitions::LifecycleAction;
use crate::api::error::ServiceError;
use crate::db::job_repository::JobRepository;
use crate::db::models::JobRow;
use crate::db::transaction_repository::{NewTransaction, TransactionRepository};
use crate::db::user_repository::UserRepository;
use crate::notify::Dispatcher;
use crate::payment::{PaymentGateway, PaymentRequest};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Job lifecycle service.
///
/// Guards run twice: conditional UPDATEs in the repository make every
/// transition atomic, and on a miss the helpers below re-fetch under the
/// caller's ownership scope to decide between "not found" (which also
/// covers "not yours", so existence is never leaked) and a precise
/// invalid-transition error. Side effects fire only after the state change
/// is durably applied, and notification failures never fail the operation.
pub struct JobService {
    pool: Pool<Postgres>,
    dispatcher: Dispatcher,
    gateway: Arc<dyn PaymentGateway>,
    payment_timeout: Duration,
}

/// Parse a stored status string, treating anything unknown as corruption
fn parse_status(job: &JobRow) -> Result<JobStatus, ServiceError> {
    JobStatus::parse(&job.job_status).ok_or_else(|| {
        ServiceError::Internal(format!(
            "job {} has unrecognized status '{}'",
            job.id, job.job_status
        ))
    })
}

/// Turn a conditional-update miss into the right error, given the job as
/// seen under the caller's scope (or not seen at all)
fn lifecycle_conflict(
    action: LifecycleAction,
    scoped: Option<JobRow>,
) -> Result<ServiceError, ServiceError> {
    match scoped {
        None => Ok(ServiceError::NotFound("Job")),
        Some(job) => {
            let status = parse_status(&job)?;
            Ok(ServiceError::InvalidTransition {
                action: action.name(),
                status,
            })
        }
    }
}

/// Why a funding claim missed, for a job visible to its requester
fn funding_conflict(job: &JobRow) -> Result<ServiceError, ServiceError> {
    match job.payment_status.as_str() {
        "paid" | "released" => Ok(ServiceError::Validation(
            "Escrow has already been funded for this job".to_string(),
        )),
        "processing" => Ok(ServiceError::Validation(
            "A payment for this job is already in progress".to_string(),
        )),
        _ => {
            let status = parse_status(job)?;
            Ok(ServiceError::InvalidTransition {
                action: LifecycleAction::FundEscrow.name(),
                status,
            })
        }
    }
}

/// Why an approval claim missed. The payment check comes first: approval
/// is a money movement, so an unfunded escrow is reported as a payment
/// error regardless of the job's status.
fn approval_conflict(job: &JobRow) -> Result<ServiceError, ServiceError> {
    match job.payment_status.as_str() {
        "unpaid" => Ok(ServiceError::PaymentFailed(
            "Escrow has not been funded for this job".to_string(),
        )),
        "processing" => Ok(ServiceError::PaymentFailed(
            "A payment for this job is already in progress".to_string(),
        )),
        "released" => Ok(ServiceError::PaymentFailed(
            "The payout for this job has already been released".to_string(),
        )),
        _ => {
            let status = parse_status(job)?;
            Ok(ServiceError::InvalidTransition {
                action: LifecycleAction::Approve.name(),
                status,
            })
        }
    }
}

impl JobService {
    pub fn new(
        pool: Pool<Postgres>,
        dispatcher: Dispatcher,
        gateway: Arc<dyn PaymentGateway>,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            dispatcher,
            gateway,
            payment_timeout,
        }
    }

    /// Requester posts a new job; matching providers are notified
    /// concurrently before the response returns
    pub async fn create_job(
        &self,
        requester_id: Uuid,
        req: &CreateJobRequest,
    ) -> Result<JobRow, ServiceError> {
        if req.deadline <= Utc::now() {
            return Err(ServiceError::Validation(
                "Deadline must be in the future".to_string(),
            ));
        }

        let job = JobRepository::create(&self.pool, req, requester_id).await?;
        info!("Job {} created by requester {}", job.id, requester_id);

        self.dispatcher.announce_job(&job).await;

        Ok(job)
    }

    /// Open jobs the provider is eligible for under the strict matching
    /// policy
    pub async fn available_jobs(&self, provider_id: Uuid) -> Result<Vec<JobRow>, ServiceError> {
        let provider = UserRepository::find_by_id(&self.pool, provider_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        let location = provider.location.as_deref().ok_or_else(|| {
            ServiceError::Validation(
                "Set a location on your profile to browse available jobs".to_string(),
            )
        })?;

        Ok(JobRepository::list_available(
            &self.pool,
            location,
            provider.reputation,
            &provider.service_categories,
        )
        .await?)
    }

    /// Jobs the caller is party to, paginated, optionally filtered by
    /// status
    pub async fn my_jobs(
        &self,
        user_id: Uuid,
        query: &MyJobsQuery,
    ) -> Result<Vec<JobRow>, ServiceError> {
        let status = match query.status.as_deref() {
            None => None,
            Some(raw) => Some(
                JobStatus::parse(raw)
                    .ok_or_else(|| {
                        ServiceError::Validation(format!("Unknown job status '{}'", raw))
                    })?
                    .as_str(),
            ),
        };

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        Ok(
            JobRepository::list_for_user(&self.pool, user_id, status, i64::from(limit), offset)
                .await?,
        )
    }

    /// Provider claims an open job (or confirms one assigned to them);
    /// the requester is notified
    pub async fn accept_job(&self, provider_id: Uuid, job_id: Uuid) -> Result<JobRow, ServiceError> {
        match JobRepository::accept(&self.pool, job_id, provider_id).await? {
            Some(job) => {
                info!("Job {} accepted by provider {}", job.id, provider_id);
                self.dispatcher
                    .notify(
                        job.requester_id,
                        &format!("Your '{}' job was accepted by a provider.", job.job_type),
                        Some(job.id),
                    )
                    .await;
                Ok(job)
            }
            None => {
                let seen = JobRepository::find_by_id(&self.pool, job_id).await?;
                Err(lifecycle_conflict(LifecycleAction::Accept, seen)?)
            }
        }
    }

    /// Acknowledgment only; rejection does not mutate the job
    pub fn reject_job(&self, provider_id: Uuid, job_id: Uuid) {
        info!("Provider {} rejected job {}", provider_id, job_id);
    }

    /// Requester assigns a specific worker to their open job
    pub async fn assign_worker(
        &self,
        requester_id: Uuid,
        job_id: Uuid,
        worker_id: Uuid,
    ) -> Result<JobRow, ServiceError> {
        let worker = UserRepository::find_by_id(&self.pool, worker_id).await?;
        match worker {
            Some(user) if user.role == "provider" => {}
            _ => {
                return Err(ServiceError::Validation(
                    "worker_id must reference an existing provider".to_string(),
                ));
            }
        }

        match JobRepository::assign(&self.pool, job_id, requester_id, worker_id).await? {
            Some(job) => {
                info!("Job {} assigned to provider {}", job.id, worker_id);
                self.dispatcher
                    .notify(
                        worker_id,
                        &format!(
                            "You have been assigned a '{}' job in {}.",
                            job.job_type, job.location
                        ),
                        Some(job.id),
                    )
                    .await;
                Ok(job)
            }
            None => {
                let seen = JobRepository::find_for_requester(&self.pool, job_id, requester_id).await?;
                Err(lifecycle_conflict(LifecycleAction::Assign, seen)?)
            }
        }
    }

    /// Assigned provider steps away; the job reopens and the requester is
    /// notified
    pub async fn unassign_job(
        &self,
        provider_id: Uuid,
        job_id: Uuid,
    ) -> Result<JobRow, ServiceError> {
        match JobRepository::unassign(&self.pool, job_id, provider_id).await? {
            Some(job) => {
                info!("Job {} unassigned by provider {}", job.id, provider_id);
                self.dispatcher
                    .notify(
                        job.requester_id,
                        &format!(
                            "The provider stepped away from your '{}' job; it is open again.",
                            job.job_type
                        ),
                        Some(job.id),
                    )
                    .await;
                Ok(job)
            }
            None => {
                let seen = JobRepository::find_for_provider(&self.pool, job_id, provider_id).await?;
                Err(lifecycle_conflict(LifecycleAction::Unassign, seen)?)
            }
        }
    }

    /// Provider marks the work done; the requester is asked to approve
    pub async fn complete_job(
        &self,
        provider_id: Uuid,
        job_id: Uuid,
    ) -> Result<JobRow, ServiceError> {
        match JobRepository::complete(&self.pool, job_id, provider_id).await? {
            Some(job) => {
                info!("Job {} completed by provider {}", job.id, provider_id);
                self.dispatcher
                    .notify(
                        job.requester_id,
                        &format!(
                            "Your '{}' job was marked complete. Review and approve it.",
                            job.job_type
                        ),
                        Some(job.id),
                    )
                    .await;
                Ok(job)
            }
            None => {
                let seen = JobRepository::find_for_provider(&self.pool, job_id, provider_id).await?;
                Err(lifecycle_conflict(LifecycleAction::Complete, seen)?)
            }
        }
    }

    /// Requester sends completed work back with feedback
    pub async fn request_revision(
        &self,
        requester_id: Uuid,
        job_id: Uuid,
        feedback: &str,
    ) -> Result<JobRow, ServiceError> {
        match JobRepository::request_revision(&self.pool, job_id, requester_id, feedback).await? {
            Some(job) => {
                info!("Revision requested on job {}", job.id);
                if let Some(provider_id) = job.provider_id {
                    self.dispatcher
                        .notify(
                            provider_id,
                            &format!(
                                "The requester asked for a revision on the '{}' job.",
                                job.job_type
                            ),
                            Some(job.id),
                        )
                        .await;
                }
                Ok(job)
            }
            None => {
                let seen = JobRepository::find_for_requester(&self.pool, job_id, requester_id).await?;
                Err(lifecycle_conflict(LifecycleAction::RequestRevision, seen)?)
            }
        }
    }

    /// Requester cancels; terminal. The assigned provider, if any, is
    /// notified.
    pub async fn cancel_job(&self, requester_id: Uuid, job_id: Uuid) -> Result<JobRow, ServiceError> {
        match JobRepository::cancel(&self.pool, job_id, requester_id).await? {
            Some(job) => {
                info!("Job {} cancelled by requester {}", job.id, requester_id);
                if let Some(provider_id) = job.provider_id {
                    self.dispatcher
                        .notify(
                            provider_id,
                            &format!(
                                "The '{}' job you were working on was cancelled by the requester.",
                                job.job_type
                            ),
                            Some(job.id),
                        )
                        .await;
                }
                Ok(job)
            }
            None => {
                let seen = JobRepository::find_for_requester(&self.pool, job_id, requester_id).await?;
                Err(lifecycle_conflict(LifecycleAction::Cancel, seen)?)
            }
        }
    }

    /// Requester funds the escrow for an accepted job.
    ///
    /// The `unpaid -> processing` claim is atomic, so the gateway is never
    /// called twice for one job. On gateway failure or timeout the claim
    /// is rolled back and the job is left untouched.
    pub async fn fund_escrow(&self, requester_id: Uuid, job_id: Uuid) -> Result<JobRow, ServiceError> {
        let claim =
            match JobRepository::begin_payment(&self.pool, job_id, requester_id, "accepted", "unpaid")
                .await?
            {
                Some(job) => job,
                None => {
                    let seen =
                        JobRepository::find_for_requester(&self.pool, job_id, requester_id).await?;
                    return Err(match seen {
                        None => ServiceError::NotFound("Job"),
                        Some(job) => funding_conflict(&job)?,
                    });
                }
            };

        let request = PaymentRequest::new(
            claim.payment,
            format!("Escrow funding for '{}' job {}", claim.job_type, claim.id),
        );
        let receipt = match timeout(self.payment_timeout, self.gateway.process_payment(&request)).await
        {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                warn!("Escrow funding failed for job {}: {}", job_id, e);
                self.release_claim(job_id, "unpaid").await;
                return Err(ServiceError::PaymentFailed(e.to_string()));
            }
            Err(_) => {
                warn!("Escrow funding timed out for job {}", job_id);
                self.release_claim(job_id, "unpaid").await;
                return Err(ServiceError::PaymentFailed(
                    "Payment gateway timed out".to_string(),
                ));
            }
        };

        let funded = JobRepository::settle_payment(
            &self.pool,
            job_id,
            "paid",
            Some(&receipt.transaction_id),
        )
        .await?
        .ok_or_else(|| {
            ServiceError::Internal(format!("funding claim on job {} disappeared", job_id))
        })?;

        info!(
            "Escrow funded for job {}: transaction {}",
            job_id, receipt.transaction_id
        );

        TransactionRepository::create(
            &self.pool,
            &NewTransaction {
                user_id: requester_id,
                amount: funded.payment,
                tx_type: "escrow_funding",
                description: format!("Escrow funding for '{}' job", funded.job_type),
                job_id: Some(funded.id),
            },
        )
        .await?;

        Ok(funded)
    }

    /// Requester approves completed work.
    ///
    /// The `paid -> processing` claim makes approval single-shot. The
    /// payout goes through the gateway first; only on success do the
    /// reputation update, ledger row and provider notification apply.
    /// The job's status stays `completed`.
    pub async fn approve_job(&self, requester_id: Uuid, job_id: Uuid) -> Result<JobRow, ServiceError> {
        let claim =
            match JobRepository::begin_payment(&self.pool, job_id, requester_id, "completed", "paid")
                .await?
            {
                Some(job) => job,
                None => {
                    let seen =
                        JobRepository::find_for_requester(&self.pool, job_id, requester_id).await?;
                    return Err(match seen {
                        None => ServiceError::NotFound("Job"),
                        Some(job) => approval_conflict(&job)?,
                    });
                }
            };

        let provider_id = claim.provider_id.ok_or_else(|| {
            ServiceError::Internal(format!("completed job {} has no provider", claim.id))
        })?;

        let request = PaymentRequest::new(
            claim.payment,
            format!("Payout for '{}' job {}", claim.job_type, claim.id),
        );
        let receipt = match timeout(self.payment_timeout, self.gateway.process_payment(&request)).await
        {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                warn!("Payout failed for job {}: {}", job_id, e);
                self.release_claim(job_id, "paid").await;
                return Err(ServiceError::PaymentFailed(e.to_string()));
            }
            Err(_) => {
                warn!("Payout timed out for job {}", job_id);
                self.release_claim(job_id, "paid").await;
                return Err(ServiceError::PaymentFailed(
                    "Payment gateway timed out".to_string(),
                ));
            }
        };

        let released = JobRepository::settle_payment(&self.pool, job_id, "released", None)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(format!("payout claim on job {} disappeared", job_id))
            })?;

        if UserRepository::increment_reputation(&self.pool, provider_id)
            .await?
            .is_none()
        {
            warn!(
                "Provider {} missing during reputation update for job {}",
                provider_id, job_id
            );
        }

        TransactionRepository::create(
            &self.pool,
            &NewTransaction {
                user_id: provider_id,
                amount: released.payment,
                tx_type: "payout",
                description: format!("Payout for '{}' job", released.job_type),
                job_id: Some(released.id),
            },
        )
        .await?;

        info!(
            "Job {} approved: payout {} released to provider {}",
            job_id, receipt.transaction_id, provider_id
        );

        self.dispatcher
            .notify(
                provider_id,
                &format!(
                    "Your work on the '{}' job was approved. Payment released.",
                    released.job_type
                ),
                Some(released.id),
            )
            .await;

        Ok(released)
    }

    /// Roll an in-flight payment claim back to its previous status. A
    /// failure here leaves the job in `processing` and is loud in the
    /// logs.
    async fn release_claim(&self, job_id: Uuid, back_to: &str) {
        if let Err(e) = JobRepository::settle_payment(&self.pool, job_id, back_to, None).await {
            error!(
                "Failed to roll job {} payment claim back to '{}': {}",
                job_id, back_to, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job_in(job_status: &str, payment_status: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            job_type: "plumbing".to_string(),
            description: "Fix the kitchen sink".to_string(),
            payment: 500,
            deadline: Utc::now(),
            location: "Pune".to_string(),
            min_reputation: 0,
            job_status: job_status.to_string(),
            payment_status: payment_status.to_string(),
            payment_transaction_id: None,
            feedback: None,
            requester_id: Uuid::new_v4(),
            provider_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unscoped_miss_is_not_found() {
        match lifecycle_conflict(LifecycleAction::Accept, None).unwrap() {
            ServiceError::NotFound(_) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn visible_miss_is_invalid_transition_with_current_status() {
        let job = job_in("cancelled", "unpaid");
        match lifecycle_conflict(LifecycleAction::Accept, Some(job)).unwrap() {
            ServiceError::InvalidTransition { action, status } => {
                assert_eq!(action, "accept");
                assert_eq!(status, JobStatus::Cancelled);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn corrupted_status_is_internal() {
        let job = job_in("garbage", "unpaid");
        assert!(matches!(
            lifecycle_conflict(LifecycleAction::Cancel, Some(job)),
            Err(ServiceError::Internal(_))
        ));
    }

    #[test]
    fn double_funding_is_a_validation_error() {
        let job = job_in("accepted", "paid");
        match funding_conflict(&job).unwrap() {
            ServiceError::Validation(msg) => assert!(msg.contains("already been funded")),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn funding_while_in_flight_is_rejected() {
        let job = job_in("accepted", "processing");
        assert!(matches!(
            funding_conflict(&job).unwrap(),
            ServiceError::Validation(_)
        ));
    }

    #[test]
    fn funding_a_non_accepted_job_is_invalid_transition() {
        let job = job_in("open", "unpaid");
        match funding_conflict(&job).unwrap() {
            ServiceError::InvalidTransition { action, status } => {
                assert_eq!(action, "fund_escrow");
                assert_eq!(status, JobStatus::Open);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn approving_unfunded_job_is_payment_failed_regardless_of_status() {
        for status in ["open", "accepted", "completed", "cancelled"] {
            let job = job_in(status, "unpaid");
            match approval_conflict(&job).unwrap() {
                ServiceError::PaymentFailed(msg) => assert!(msg.contains("not been funded")),
                other => panic!("expected PaymentFailed for '{}', got {:?}", status, other),
            }
        }
    }

    #[test]
    fn double_approval_is_payment_failed() {
        let job = job_in("completed", "released");
        match approval_conflict(&job).unwrap() {
            ServiceError::PaymentFailed(msg) => assert!(msg.contains("already been released")),
            other => panic!("expected PaymentFailed, got {:?}", other),
        }
    }

    #[test]
    fn approving_funded_but_uncompleted_job_is_invalid_transition() {
        let job = job_in("accepted", "paid");
        match approval_conflict(&job).unwrap() {
            ServiceError::InvalidTransition { action, status } => {
                assert_eq!(action, "approve");
                assert_eq!(status, JobStatus::Accepted);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }
}
