//! User repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use chrono::Utc;
use crate::database::store::UserStore;
use crate::models::user::{User, Role, CreateUserRequest, PushSubscription, NewPushSubscription};
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// Create a new user
    async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, role, language_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, name, email, role, language_code, created_at, updated_at
            "#
        )
        .bind(request.name)
        .bind(request.email)
        .bind(request.role.unwrap_or(Role::Volunteer))
        .bind(request.language_code.unwrap_or_else(|| "en".to_string()))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, language_code, created_at, updated_at FROM users WHERE id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn push_subscriptions(&self, user_id: i64) -> Result<Vec<PushSubscription>> {
        let subscriptions = sqlx::query_as::<_, PushSubscription>(
            "SELECT id, user_id, endpoint, p256dh, auth, created_at FROM push_subscriptions WHERE user_id = $1 ORDER BY id ASC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    async fn save_push_subscription(&self, user_id: i64, subscription: NewPushSubscription) -> Result<PushSubscription> {
        let saved = sqlx::query_as::<_, PushSubscription>(
            r#"
            INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (endpoint) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            RETURNING id, user_id, endpoint, p256dh, auth, created_at
            "#
        )
        .bind(user_id)
        .bind(subscription.endpoint)
        .bind(subscription.keys.p256dh)
        .bind(subscription.keys.auth)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn remove_push_subscription(&self, user_id: i64, endpoint: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE user_id = $1 AND endpoint = $2")
            .bind(user_id)
            .bind(endpoint)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn prune_push_subscription(&self, subscription_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM push_subscriptions WHERE id = $1")
            .bind(subscription_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
