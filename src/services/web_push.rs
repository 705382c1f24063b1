//! Web Push transport over HTTP with VAPID authentication
//!
//! Payloads are JSON, encrypted for the subscription's keys before sending.

use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;
use crate::config::PushConfig;
use crate::models::PushSubscription;
use crate::services::push::{DeliveryError, PushPayload, PushTransport};
use crate::services::push_encryption::{self, ReceiverKeys, CONTENT_ENCODING as AES128GCM};
use crate::utils::errors::{Result, VolunteerHubError};

/// VAPID tokens are valid for at most 24 hours; stay well below
const VAPID_TOKEN_LIFETIME_SECS: i64 = 12 * 3600;

/// Claims of the VAPID JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct VapidClaims {
    /// Origin of the push service endpoint
    pub aud: String,
    pub exp: i64,
    /// Contact URI of the application server
    pub sub: String,
}

pub struct WebPushTransport {
    client: reqwest::Client,
    signing_key: EncodingKey,
    public_key: String,
    subject: String,
    ttl_seconds: u32,
}

impl WebPushTransport {
    pub fn new(config: &PushConfig) -> Result<Self> {
        let signing_key = EncodingKey::from_ec_pem(config.vapid_private_key_pem.as_bytes())
            .map_err(|e| VolunteerHubError::Config(format!("Invalid VAPID private key: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            signing_key,
            public_key: config.vapid_public_key.clone(),
            subject: config.subject.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }

    /// `Authorization` header value for a subscription endpoint
    pub fn vapid_authorization(&self, endpoint: &str) -> std::result::Result<String, DeliveryError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| DeliveryError::Transport(format!("invalid endpoint: {}", e)))?;

        let claims = VapidClaims {
            aud: endpoint.origin().ascii_serialization(),
            exp: Utc::now().timestamp() + VAPID_TOKEN_LIFETIME_SECS,
            sub: self.subject.clone(),
        };

        let token = encode(&Header::new(Algorithm::ES256), &claims, &self.signing_key)
            .map_err(|e| DeliveryError::Transport(format!("signing VAPID token: {}", e)))?;

        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn deliver(&self, subscription: &PushSubscription, payload: &PushPayload) -> std::result::Result<(), DeliveryError> {
        let authorization = self.vapid_authorization(&subscription.endpoint)?;
        let keys = ReceiverKeys::decode(&subscription.p256dh, &subscription.auth)
            .map_err(|e| DeliveryError::Encryption(e.to_string()))?;
        let plaintext = serde_json::to_vec(payload).map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let body = push_encryption::encrypt(&plaintext, &keys).map_err(|e| DeliveryError::Encryption(e.to_string()))?;

        let response = self
            .client
            .post(&subscription.endpoint)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_ENCODING, AES128GCM)
            .header("TTL", self.ttl_seconds.to_string())
            .header("Urgency", "normal")
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::from_status(status.as_u16()))
        }
    }
}
