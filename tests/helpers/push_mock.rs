//! Push and store doubles
//!
//! `RecordingPushTransport` keeps every delivered payload in memory,
//! `FailingNotificationStore` rejects every write and `PushMockServer`
//! stands in for a browser push service over HTTP.

use std::collections::HashSet;
use std::sync::Mutex;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hkdf::Hkdf;
use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use sha2::Sha256;
use volunteer_hub::database::NotificationStore;
use volunteer_hub::models::{NewNotification, Notification, PushSubscription};
use volunteer_hub::services::{DeliveryError, PushPayload, PushTransport};
use volunteer_hub::{Result, VolunteerHubError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use super::test_data::{BROWSER_AUTH_SECRET, BROWSER_PRIVATE_KEY};

/// A push message as seen by the transport
#[derive(Debug, Clone)]
pub struct DeliveredPush {
    pub user_id: i64,
    pub endpoint: String,
    pub payload: PushPayload,
}

#[derive(Default)]
pub struct RecordingPushTransport {
    delivered: Mutex<Vec<DeliveredPush>>,
    gone: Mutex<HashSet<String>>,
}

impl RecordingPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer 410 for this endpoint from now on
    pub fn expire(&self, endpoint: &str) {
        self.gone.lock().unwrap().insert(endpoint.to_string());
    }

    pub fn delivered(&self) -> Vec<DeliveredPush> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_to(&self, user_id: i64) -> Vec<DeliveredPush> {
        self.delivered().into_iter().filter(|d| d.user_id == user_id).collect()
    }
}

#[async_trait]
impl PushTransport for RecordingPushTransport {
    async fn deliver(&self, subscription: &PushSubscription, payload: &PushPayload) -> std::result::Result<(), DeliveryError> {
        if self.gone.lock().unwrap().contains(&subscription.endpoint) {
            return Err(DeliveryError::Gone(410));
        }
        self.delivered.lock().unwrap().push(DeliveredPush {
            user_id: subscription.user_id,
            endpoint: subscription.endpoint.clone(),
            payload: payload.clone(),
        });
        Ok(())
    }
}

/// Notification store that is always down
pub struct FailingNotificationStore;

fn unavailable<T>() -> Result<T> {
    Err(VolunteerHubError::DependencyFailure("notification store unavailable".to_string()))
}

#[async_trait]
impl NotificationStore for FailingNotificationStore {
    async fn insert_notification(&self, _notification: NewNotification) -> Result<Notification> {
        unavailable()
    }

    async fn find_notification(&self, _notification_id: i64) -> Result<Option<Notification>> {
        unavailable()
    }

    async fn latest_for_user(&self, _user_id: i64, _limit: i64) -> Result<Vec<Notification>> {
        unavailable()
    }

    async fn unread_count(&self, _user_id: i64) -> Result<i64> {
        unavailable()
    }

    async fn mark_read(&self, _notification_id: i64) -> Result<()> {
        unavailable()
    }

    async fn mark_all_read(&self, _user_id: i64) -> Result<u64> {
        unavailable()
    }

    async fn delete_notification(&self, _notification_id: i64) -> Result<()> {
        unavailable()
    }
}

/// Push service stand-in with one endpoint per canned response
pub struct PushMockServer {
    pub server: MockServer,
}

impl PushMockServer {
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Absolute endpoint URL for a path on this server
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/push/{}", self.server.uri(), name)
    }

    /// Respond to `/push/{name}` with `status`
    pub async fn respond(&self, name: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("/push/{}", name)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn received(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

/// Header fields and plaintext of an `aes128gcm` push message
pub struct DecryptedPush {
    pub record_size: u32,
    pub plaintext: Vec<u8>,
}

/// Decrypt a message addressed to the fixture browser keys
pub fn decrypt_push(message: &[u8]) -> DecryptedPush {
    let salt = &message[..16];
    let record_size = u32::from_be_bytes(message[16..20].try_into().unwrap());
    let id_len = message[20] as usize;
    let sender_public = &message[21..21 + id_len];
    let ciphertext = &message[21 + id_len..];

    let browser = SecretKey::from_slice(&URL_SAFE_NO_PAD.decode(BROWSER_PRIVATE_KEY).unwrap()).unwrap();
    let browser_point = browser.public_key().to_encoded_point(false);
    let sender = PublicKey::from_sec1_bytes(sender_public).unwrap();
    let shared = diffie_hellman(browser.to_nonzero_scalar(), sender.as_affine());
    let auth = URL_SAFE_NO_PAD.decode(BROWSER_AUTH_SECRET).unwrap();

    let mut key_info = b"WebPush: info\0".to_vec();
    key_info.extend_from_slice(browser_point.as_bytes());
    key_info.extend_from_slice(sender_public);
    let mut ikm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(&auth[..]), shared.raw_secret_bytes())
        .expand(&key_info, &mut ikm)
        .unwrap();

    let content = Hkdf::<Sha256>::new(Some(salt), &ikm);
    let mut cek = [0u8; 16];
    let mut nonce = [0u8; 12];
    content.expand(b"Content-Encoding: aes128gcm\0", &mut cek).unwrap();
    content.expand(b"Content-Encoding: nonce\0", &mut nonce).unwrap();

    let mut record = Aes128Gcm::new_from_slice(&cek)
        .unwrap()
        .decrypt(Nonce::from_slice(&nonce), ciphertext)
        .expect("push message does not decrypt with the browser keys");
    let delimiter = record.iter().rposition(|&b| b != 0).expect("empty record");
    assert_eq!(record[delimiter], 0x02, "last record delimiter");
    record.truncate(delimiter);

    DecryptedPush { record_size, plaintext: record }
}
