//! Message encryption for Web Push (RFC 8291, `aes128gcm` content coding)
//!
//! Every message is a single record. A fresh P-256 key pair and salt are
//! generated per message; the browser derives the same content key from its
//! subscription private key and the `auth` secret.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hkdf::Hkdf;
use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::Rng;
use sha2::Sha256;
use thiserror::Error;

/// Value of the `Content-Encoding` header for encrypted messages
pub const CONTENT_ENCODING: &str = "aes128gcm";

/// Record size written to the header
pub const RECORD_SIZE: u32 = 4096;

const SALT_LEN: usize = 16;
const AUTH_SECRET_LEN: usize = 16;
const PUBLIC_KEY_LEN: usize = 65;
const TAG_LEN: usize = 16;
const LAST_RECORD_DELIMITER: u8 = 0x02;

/// Salt, record size, key id length and the sender public key
pub const HEADER_LEN: usize = SALT_LEN + 4 + 1 + PUBLIC_KEY_LEN;

/// Largest plaintext push services accept in one message
pub const MAX_PLAINTEXT_LEN: usize = RECORD_SIZE as usize - HEADER_LEN - TAG_LEN - 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("invalid subscription key: {0}")]
    InvalidKey(&'static str),

    #[error("payload of {0} bytes does not fit a push message")]
    PayloadTooLarge(usize),

    #[error("encryption failed")]
    EncryptionFailed,
}

/// Decoded `p256dh` and `auth` values of a browser subscription
#[derive(Debug, Clone)]
pub struct ReceiverKeys {
    public_key: PublicKey,
    public_bytes: Vec<u8>,
    auth_secret: [u8; AUTH_SECRET_LEN],
}

impl ReceiverKeys {
    /// Decode the base64url values a browser reports in `PushSubscription.keys`
    pub fn decode(p256dh: &str, auth: &str) -> Result<Self, EncryptionError> {
        let public_bytes = decode_base64url(p256dh).ok_or(EncryptionError::InvalidKey("p256dh is not base64url"))?;
        if public_bytes.len() != PUBLIC_KEY_LEN {
            return Err(EncryptionError::InvalidKey("p256dh must be an uncompressed P-256 point"));
        }
        let public_key = PublicKey::from_sec1_bytes(&public_bytes)
            .map_err(|_| EncryptionError::InvalidKey("p256dh is not a point on P-256"))?;

        let auth_bytes = decode_base64url(auth).ok_or(EncryptionError::InvalidKey("auth is not base64url"))?;
        let auth_secret: [u8; AUTH_SECRET_LEN] = auth_bytes
            .as_slice()
            .try_into()
            .map_err(|_| EncryptionError::InvalidKey("auth must be 16 bytes"))?;

        Ok(Self {
            public_key,
            public_bytes,
            auth_secret,
        })
    }
}

fn decode_base64url(value: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(value.trim().trim_end_matches('=')).ok()
}

/// Encrypt a message body for one subscription
pub fn encrypt(plaintext: &[u8], receiver: &ReceiverKeys) -> Result<Vec<u8>, EncryptionError> {
    let sender = SecretKey::random(&mut OsRng);
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill(&mut salt);
    encrypt_with(plaintext, receiver, &sender, &salt)
}

fn encrypt_with(
    plaintext: &[u8],
    receiver: &ReceiverKeys,
    sender: &SecretKey,
    salt: &[u8; SALT_LEN],
) -> Result<Vec<u8>, EncryptionError> {
    if plaintext.len() > MAX_PLAINTEXT_LEN {
        return Err(EncryptionError::PayloadTooLarge(plaintext.len()));
    }

    let sender_point = sender.public_key().to_encoded_point(false);
    let sender_public = sender_point.as_bytes();
    let shared = diffie_hellman(sender.to_nonzero_scalar(), receiver.public_key.as_affine());

    let mut key_info = Vec::with_capacity(14 + 2 * PUBLIC_KEY_LEN);
    key_info.extend_from_slice(b"WebPush: info\0");
    key_info.extend_from_slice(&receiver.public_bytes);
    key_info.extend_from_slice(sender_public);

    let mut ikm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(&receiver.auth_secret[..]), shared.raw_secret_bytes())
        .expand(&key_info, &mut ikm)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let content = Hkdf::<Sha256>::new(Some(&salt[..]), &ikm);
    let mut cek = [0u8; 16];
    let mut nonce = [0u8; 12];
    content
        .expand(b"Content-Encoding: aes128gcm\0", &mut cek)
        .map_err(|_| EncryptionError::EncryptionFailed)?;
    content
        .expand(b"Content-Encoding: nonce\0", &mut nonce)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let mut record = Vec::with_capacity(plaintext.len() + 1);
    record.extend_from_slice(plaintext);
    record.push(LAST_RECORD_DELIMITER);

    let cipher = Aes128Gcm::new_from_slice(&cek).map_err(|_| EncryptionError::EncryptionFailed)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), record.as_slice())
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let mut message = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    message.extend_from_slice(salt);
    message.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    message.push(sender_public.len() as u8);
    message.extend_from_slice(sender_public);
    message.extend_from_slice(&ciphertext);
    Ok(message)
}
