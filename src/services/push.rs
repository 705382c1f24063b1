//! Push delivery service
//!
//! Best-effort Web Push fan-out. Delivery problems never surface as errors:
//! they are logged and counted in a [`PushReport`]. Subscriptions the push
//! service reports as gone are pruned.

use std::ops::AddAssign;
use std::sync::Arc;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use crate::config::PushConfig;
use crate::database::UserStore;
use crate::models::{Actor, NewPushSubscription, PushSubscription};
use crate::services::push_encryption::ReceiverKeys;
use crate::utils::errors::{Result, VolunteerHubError};
use crate::utils::helpers::{is_http_url, truncate_text};
use crate::utils::logging::log_delivery_failure;

/// JSON body delivered to the service worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The subscription no longer exists (HTTP 404 or 410)
    #[error("subscription gone (status {0})")]
    Gone(u16),

    #[error("push service rejected the message (status {0})")]
    Rejected(u16),

    /// The subscription keys cannot be used to encrypt the payload
    #[error("payload encryption failed: {0}")]
    Encryption(String),

    #[error("push transport failed: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Classify a push service response status
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => DeliveryError::Gone(status),
            other => DeliveryError::Rejected(other),
        }
    }
}

/// Sends one payload to one subscription
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn deliver(&self, subscription: &PushSubscription, payload: &PushPayload) -> std::result::Result<(), DeliveryError>;
}

/// Outcome counts of a push fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub sent: usize,
    pub failed: usize,
    pub pruned: usize,
}

impl AddAssign for PushReport {
    fn add_assign(&mut self, other: Self) {
        self.sent += other.sent;
        self.failed += other.failed;
        self.pruned += other.pruned;
    }
}

/// Longest body most push services display without clipping
const MAX_BODY_CHARS: usize = 240;

#[derive(Clone)]
pub struct PushService {
    users: Arc<dyn UserStore>,
    /// `None` when push delivery is disabled
    transport: Option<Arc<dyn PushTransport>>,
    icon: Option<String>,
    badge: Option<String>,
    concurrency: usize,
}

impl PushService {
    pub fn new(users: Arc<dyn UserStore>, transport: Arc<dyn PushTransport>, config: &PushConfig) -> Self {
        Self {
            users,
            transport: Some(transport),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// A service that accepts every request and sends nothing
    pub fn disabled(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            transport: None,
            icon: None,
            badge: None,
            concurrency: 1,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Store a browser subscription for the actor, taking over an existing endpoint
    pub async fn subscribe(&self, actor: &Actor, subscription: NewPushSubscription) -> Result<PushSubscription> {
        if !is_http_url(&subscription.endpoint) {
            return Err(VolunteerHubError::InvalidInput("subscription endpoint must be an http(s) URL".to_string()));
        }
        if subscription.keys.p256dh.trim().is_empty() || subscription.keys.auth.trim().is_empty() {
            return Err(VolunteerHubError::InvalidInput("subscription keys are required".to_string()));
        }
        ReceiverKeys::decode(&subscription.keys.p256dh, &subscription.keys.auth)
            .map_err(|e| VolunteerHubError::InvalidInput(e.to_string()))?;

        let saved = self.users.save_push_subscription(actor.user_id, subscription).await?;
        info!(user_id = actor.user_id, subscription_id = saved.id, "Push subscription saved");
        Ok(saved)
    }

    /// Remove one of the actor's subscriptions; returns whether it existed
    pub async fn unsubscribe(&self, actor: &Actor, endpoint: &str) -> Result<bool> {
        let removed = self.users.remove_push_subscription(actor.user_id, endpoint).await?;
        debug!(user_id = actor.user_id, removed = removed, "Push unsubscribe");
        Ok(removed)
    }

    pub fn payload(&self, title: &str, body: &str, link: Option<&str>) -> PushPayload {
        PushPayload {
            title: title.to_string(),
            body: truncate_text(body, MAX_BODY_CHARS),
            icon: self.icon.clone(),
            badge: self.badge.clone(),
            url: link.map(str::to_string),
        }
    }

    /// Deliver to every subscription of one user
    pub async fn send_to_user(&self, user_id: i64, title: &str, body: &str, link: Option<&str>) -> PushReport {
        let Some(transport) = &self.transport else {
            return PushReport::default();
        };

        let subscriptions = match self.users.push_subscriptions(user_id).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                log_delivery_failure("push", user_id, &e.to_string(), Some("loading subscriptions"));
                return PushReport::default();
            }
        };
        if subscriptions.is_empty() {
            debug!(user_id = user_id, "No push subscriptions");
            return PushReport::default();
        }

        let payload = self.payload(title, body, link);
        let mut report = PushReport::default();
        for subscription in &subscriptions {
            match transport.deliver(subscription, &payload).await {
                Ok(()) => report.sent += 1,
                Err(DeliveryError::Gone(status)) => {
                    report.failed += 1;
                    info!(user_id = user_id, subscription_id = subscription.id, status = status, "Pruning expired push subscription");
                    match self.users.prune_push_subscription(subscription.id).await {
                        Ok(()) => report.pruned += 1,
                        Err(e) => log_delivery_failure("push", user_id, &e.to_string(), Some("pruning subscription")),
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    log_delivery_failure("push", user_id, &e.to_string(), Some(&subscription.endpoint));
                }
            }
        }

        report
    }

    /// Independent fan-out to many users with bounded concurrency
    pub async fn send_to_many(&self, user_ids: &[i64], title: &str, body: &str, link: Option<&str>) -> PushReport {
        let reports: Vec<PushReport> = stream::iter(user_ids.iter().copied())
            .map(|user_id| self.send_to_user(user_id, title, body, link))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        reports.into_iter().fold(PushReport::default(), |mut total, report| {
            total += report;
            total
        })
    }
}
