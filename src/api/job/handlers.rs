use actix_web::{
    HttpResponse, get, patch, post,
    web::{Data, Path, Query, ServiceConfig, scope},
};
use actix_web_validator::Json;
use uuid::Uuid;

use super::dto::{AckResponse, JobListResponse, JobResponse};
use super::models::{AssignWorkerRequest, CreateJobRequest, MyJobsQuery, RevisionRequest};
use super::service::JobService;
use crate::api::error::ServiceError;
use crate::auth::{AuthUser, Role};

#[post("")]
async fn create_job(
    service: Data<JobService>,
    user: AuthUser,
    body: Json<CreateJobRequest>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Requester)?;
    let job = service.create_job(user.id, &body).await?;
    Ok(HttpResponse::Created().json(JobResponse {
        message: "Job created successfully".to_string(),
        job,
    }))
}

#[get("/available")]
async fn available_jobs(
    service: Data<JobService>,
    user: AuthUser,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Provider)?;
    let jobs = service.available_jobs(user.id).await?;
    Ok(HttpResponse::Ok().json(JobListResponse {
        results: jobs.len(),
        jobs,
    }))
}

#[get("/my")]
async fn my_jobs(
    service: Data<JobService>,
    user: AuthUser,
    query: Query<MyJobsQuery>,
) -> Result<HttpResponse, ServiceError> {
    let jobs = service.my_jobs(user.id, &query).await?;
    Ok(HttpResponse::Ok().json(JobListResponse {
        results: jobs.len(),
        jobs,
    }))
}

#[patch("/{id}/accept")]
async fn accept_job(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Provider)?;
    let job = service.accept_job(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Job accepted successfully".to_string(),
        job,
    }))
}

#[patch("/{id}/reject")]
async fn reject_job(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Provider)?;
    service.reject_job(user.id, path.into_inner());
    Ok(HttpResponse::Ok().json(AckResponse {
        message: "Job rejection noted".to_string(),
    }))
}

#[patch("/{id}/assign")]
async fn assign_worker(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
    body: Json<AssignWorkerRequest>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Requester)?;
    let job = service
        .assign_worker(user.id, path.into_inner(), body.worker_id)
        .await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Worker assigned".to_string(),
        job,
    }))
}

#[patch("/{id}/unassign")]
async fn unassign_job(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Provider)?;
    let job = service.unassign_job(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Job unassigned; it is open again".to_string(),
        job,
    }))
}

#[patch("/{id}/complete")]
async fn complete_job(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Provider)?;
    let job = service.complete_job(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Job marked as complete. Awaiting requester approval".to_string(),
        job,
    }))
}

#[patch("/{id}/revision")]
async fn request_revision(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
    body: Json<RevisionRequest>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Requester)?;
    let job = service
        .request_revision(user.id, path.into_inner(), &body.feedback)
        .await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Revision requested".to_string(),
        job,
    }))
}

#[patch("/{id}/approve")]
async fn approve_job(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Requester)?;
    let job = service.approve_job(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Job approved and payment released to the provider".to_string(),
        job,
    }))
}

#[patch("/{id}/cancel")]
async fn cancel_job(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Requester)?;
    let job = service.cancel_job(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Job cancelled".to_string(),
        job,
    }))
}

#[post("/{id}/fund")]
async fn fund_escrow(
    service: Data<JobService>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    user.require(Role::Requester)?;
    let job = service.fund_escrow(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JobResponse {
        message: "Escrow funded".to_string(),
        job,
    }))
}

pub fn job_config(config: &mut ServiceConfig) {
    config.service(
        scope("jobs")
            .service(create_job)
            .service(available_jobs)
            .service(my_jobs)
            .service(accept_job)
            .service(reject_job)
            .service(assign_worker)
            .service(unassign_job)
            .service(complete_job)
            .service(request_revision)
            .service(approve_job)
            .service(cancel_job)
            .service(fund_escrow),
    );
}
