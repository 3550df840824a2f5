use actix_web::{
    HttpResponse, get, patch,
    web::{Data, Path, ServiceConfig, scope},
};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::api::error::ServiceError;
use crate::auth::AuthUser;
use crate::db::models::NotificationRow;
use crate::db::notification_repository::NotificationRepository;

#[derive(Serialize)]
struct NotificationListResponse {
    results: usize,
    notifications: Vec<NotificationRow>,
}

#[derive(Serialize)]
struct NotificationResponse {
    message: String,
    notification: NotificationRow,
}

#[get("")]
async fn my_notifications(
    pool: Data<Pool<Postgres>>,
    user: AuthUser,
) -> Result<HttpResponse, ServiceError> {
    let notifications = NotificationRepository::list_for_user(&pool, user.id).await?;
    Ok(HttpResponse::Ok().json(NotificationListResponse {
        results: notifications.len(),
        notifications,
    }))
}

/// Mark one of the caller's notifications as read. Scoped to the
/// recipient; someone else's notification reads as not found.
#[patch("/{id}/read")]
async fn mark_read(
    pool: Data<Pool<Postgres>>,
    user: AuthUser,
    path: Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    match NotificationRepository::mark_read(&pool, path.into_inner(), user.id).await? {
        Some(notification) => Ok(HttpResponse::Ok().json(NotificationResponse {
            message: "Notification marked as read".to_string(),
            notification,
        })),
        None => Err(ServiceError::NotFound("Notification")),
    }
}

pub fn notification_config(config: &mut ServiceConfig) {
    config.service(
        scope("notifications")
            .service(my_notifications)
            .service(mark_read),
    );
}
