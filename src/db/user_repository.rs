use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::db::models::UserRow;

/// Fields a user may change about themselves. Reputation and role are
/// deliberately absent; reputation moves only through `increment_reputation`.
#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub availability_status: Option<String>,
    pub push_token: Option<String>,
}

/// Repository for User database operations
pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(
        pool: &Pool<Postgres>,
        id: Uuid,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Providers eligible for a new job under the strict matching policy:
    /// available, same location, reputation at or above the job's
    /// threshold, and serving the job's category
    pub async fn find_matching_providers(
        pool: &Pool<Postgres>,
        location: &str,
        min_reputation: i32,
        job_type: &str,
    ) -> Result<Vec<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE role = 'provider'
              AND availability_status = 'available'
              AND location = $1
              AND reputation >= $2
              AND $3 = ANY(service_categories)
            "#,
        )
        .bind(location)
        .bind(min_reputation)
        .bind(job_type)
        .fetch_all(pool)
        .await
    }

    /// The single reputation mutation in the system: +1 per approved job
    pub async fn increment_reputation(
        pool: &Pool<Postgres>,
        provider_id: Uuid,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        debug!("Incrementing reputation for provider {}", provider_id);

        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET reputation = reputation + 1, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(provider_id)
        .fetch_optional(pool)
        .await
    }

    /// Apply a profile patch; absent fields keep their current value
    pub async fn update_profile(
        pool: &Pool<Postgres>,
        id: Uuid,
        patch: &ProfilePatch,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                availability_status = COALESCE($4, availability_status),
                push_token = COALESCE($5, push_token),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.location.as_deref())
        .bind(patch.availability_status.as_deref())
        .bind(patch.push_token.as_deref())
        .fetch_optional(pool)
        .await
    }
}
