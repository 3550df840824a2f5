use actix_web::{
    HttpResponse, get, patch,
    web::{Data, Path, ServiceConfig, scope},
};
use actix_web_validator::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::api::error::ServiceError;
use crate::auth::AuthUser;
use crate::db::models::UserRow;
use crate::db::user_repository::{ProfilePatch, UserRepository};

/// Profile fields a user may update about themselves. Role and reputation
/// are not writable through this path.
#[derive(Deserialize, Debug, Validate)]
struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    name: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Location is too short"))]
    location: Option<String>,
    availability_status: Option<String>,
    push_token: Option<String>,
}

#[derive(Serialize)]
struct UserResponse {
    user: UserRow,
}

#[get("/me")]
async fn get_me(pool: Data<Pool<Postgres>>, user: AuthUser) -> Result<HttpResponse, ServiceError> {
    let row = UserRepository::find_by_id(&pool, user.id)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(UserResponse { user: row }))
}

#[get("/{id}")]
async fn get_user(
    pool: Data<Pool<Postgres>>,
    _user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let row = UserRepository::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or(ServiceError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(UserResponse { user: row }))
}

#[patch("/me")]
async fn update_me(
    pool: Data<Pool<Postgres>>,
    user: AuthUser,
    body: Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ServiceError> {
    if let Some(availability) = body.availability_status.as_deref() {
        if availability != "available" && availability != "unavailable" {
            return Err(ServiceError::Validation(
                "availability_status must be 'available' or 'unavailable'".to_string(),
            ));
        }
    }

    let patch = ProfilePatch {
        name: body.name.clone(),
        location: body.location.clone(),
        availability_status: body.availability_status.clone(),
        push_token: body.push_token.clone(),
    };

    let row = UserRepository::update_profile(&pool, user.id, &patch)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(UserResponse { user: row }))
}

pub fn user_config(config: &mut ServiceConfig) {
    config.service(scope("users").service(get_me).service(update_me).service(get_user));
}
