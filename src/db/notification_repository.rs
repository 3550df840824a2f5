use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::db::models::NotificationRow;

/// Repository for Notification database operations
pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn create(
        pool: &Pool<Postgres>,
        user_id: Uuid,
        message: &str,
        job_id: Option<Uuid>,
    ) -> Result<NotificationRow, sqlx::Error> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (id, user_id, message, job_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(message)
        .bind(job_id)
        .fetch_one(pool)
        .await
    }

    /// The user's notifications, newest first
    pub async fn list_for_user(
        pool: &Pool<Postgres>,
        user_id: Uuid,
    ) -> Result<Vec<NotificationRow>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Flip the read flag; scoped to the recipient so no one else can
    /// touch it
    pub async fn mark_read(
        pool: &Pool<Postgres>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<NotificationRow>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
