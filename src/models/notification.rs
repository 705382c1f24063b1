//! Notification model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    RegistrationReceived,
    RegistrationPending,
    RegistrationApproved,
    RegistrationRejected,
    CheckedIn,
    Completed,
    PostLike,
    PostComment,
}

impl NotificationType {
    /// Translation key segment under `notifications.`
    pub fn key(&self) -> &'static str {
        match self {
            NotificationType::RegistrationReceived => "registration_received",
            NotificationType::RegistrationPending => "registration_pending",
            NotificationType::RegistrationApproved => "registration_approved",
            NotificationType::RegistrationRejected => "registration_rejected",
            NotificationType::CheckedIn => "checked_in",
            NotificationType::Completed => "completed",
            NotificationType::PostLike => "post_like",
            NotificationType::PostComment => "post_comment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub event_id: Option<i64>,
    pub related_user_id: Option<i64>,
    pub post_id: Option<i64>,
    pub is_read: bool,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewNotification {
    pub user_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub event_id: Option<i64>,
    pub related_user_id: Option<i64>,
    pub post_id: Option<i64>,
    pub link: Option<String>,
}
