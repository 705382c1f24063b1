//! Notification service implementation
//!
//! Emits in-app notification records and serves the addressee's inbox.

use std::sync::Arc;
use tracing::debug;
use crate::database::NotificationStore;
use crate::models::{Actor, NewNotification, Notification};
use crate::utils::errors::{Result, VolunteerHubError};
use crate::utils::helpers::clamp_limit;

pub const DEFAULT_INBOX_LIMIT: i64 = 20;
pub const MAX_INBOX_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Persist a notification for its target user. No retry.
    pub async fn emit(&self, notification: NewNotification) -> Result<Notification> {
        let created = self.store.insert_notification(notification).await?;
        debug!(
            notification_id = created.id,
            user_id = created.user_id,
            notification_type = created.notification_type.key(),
            "Notification emitted"
        );
        Ok(created)
    }

    /// Latest notifications of the actor, newest first
    pub async fn list(&self, actor: &Actor, limit: Option<i64>) -> Result<Vec<Notification>> {
        let limit = clamp_limit(limit, DEFAULT_INBOX_LIMIT, MAX_INBOX_LIMIT);
        self.store.latest_for_user(actor.user_id, limit).await
    }

    pub async fn unread_count(&self, actor: &Actor) -> Result<i64> {
        self.store.unread_count(actor.user_id).await
    }

    pub async fn mark_read(&self, actor: &Actor, notification_id: i64) -> Result<()> {
        self.owned(actor, notification_id).await?;
        self.store.mark_read(notification_id).await
    }

    /// Returns the number of notifications that changed state
    pub async fn mark_all_read(&self, actor: &Actor) -> Result<u64> {
        self.store.mark_all_read(actor.user_id).await
    }

    pub async fn delete(&self, actor: &Actor, notification_id: i64) -> Result<()> {
        self.owned(actor, notification_id).await?;
        self.store.delete_notification(notification_id).await
    }

    async fn owned(&self, actor: &Actor, notification_id: i64) -> Result<Notification> {
        let notification = self
            .store
            .find_notification(notification_id)
            .await?
            .ok_or(VolunteerHubError::NotificationNotFound { notification_id })?;

        if notification.user_id != actor.user_id {
            return Err(VolunteerHubError::Unauthorized("not the addressee".to_string()));
        }
        Ok(notification)
    }
}
