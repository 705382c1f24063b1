//! Notification repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use chrono::Utc;
use crate::database::store::NotificationStore;
use crate::models::notification::{Notification, NewNotification};
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let created = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message, event_id, related_user_id, post_id, link, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, notification_type, title, message, event_id, related_user_id, post_id, is_read, link, created_at
            "#
        )
        .bind(notification.user_id)
        .bind(notification.notification_type)
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.event_id)
        .bind(notification.related_user_id)
        .bind(notification.post_id)
        .bind(notification.link)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_notification(&self, notification_id: i64) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            "SELECT id, user_id, notification_type, title, message, event_id, related_user_id, post_id, is_read, link, created_at FROM notifications WHERE id = $1"
        )
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn latest_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, notification_type, title, message, event_id, related_user_id, post_id, is_read, link, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn unread_count(&self, user_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read"
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn mark_read(&self, notification_id: i64) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, notification_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
