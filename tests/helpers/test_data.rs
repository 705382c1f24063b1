//! Test fixtures
//!
//! Settings, request builders, tokens and VAPID key material shared by the
//! integration tests.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use volunteer_hub::config::{PushConfig, Settings};
use volunteer_hub::middleware::Claims;
use volunteer_hub::models::{CreateEventRequest, EventCategory, NewPushSubscription, PushSubscriptionKeys, Role};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-chars";

pub const VAPID_PRIVATE_KEY: &str = include_str!("../fixtures/vapid_private.pem");
pub const VAPID_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/vapid_public.pem");
pub const VAPID_PUBLIC_KEY: &str = "BF3WL1vAJjSXO-VxHgOx7JkdQS2MMzZOtKPdXZcDNqYlrav4n9Opx5XwjPYH3p3-VkwsHDzm2z0OfmMi_ofPk4I";

/// Browser-side subscription key pair and auth secret (RFC 8291 Appendix A)
pub const BROWSER_PRIVATE_KEY: &str = "q1dXpw3UpT5VOmu_cf_v6ih07Aems3njxI-JWgLcM94";
pub const BROWSER_PUBLIC_KEY: &str = "BCVxsr7N_eNgVRqvHtD0zTZsEc6-VV-JvLexhqUzORcxaOzi6-AYWXvTBHm4bjyPjs7Vd8pZGH6SRpkNtoIAiw4";
pub const BROWSER_AUTH_SECRET: &str = "BTBZMqHH6r4Tts7J_aSIgg";

/// Valid settings with push disabled
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    settings.database.url = "postgresql://localhost/volunteerhub_test".to_string();
    settings
}

/// Push settings pointing at the fixture key pair
pub fn test_push_config() -> PushConfig {
    PushConfig {
        enabled: true,
        vapid_public_key: VAPID_PUBLIC_KEY.to_string(),
        vapid_private_key_pem: VAPID_PRIVATE_KEY.to_string(),
        subject: "mailto:ops@volunteerhub.test".to_string(),
        icon: Some("/icons/icon-192x192.png".to_string()),
        badge: None,
        ttl_seconds: 60,
        timeout_seconds: 5,
        concurrency: 4,
    }
}

pub fn event_request(max_participants: i32) -> CreateEventRequest {
    event_request_at(Utc::now() + Duration::days(7), max_participants)
}

pub fn event_request_at(event_date: DateTime<Utc>, max_participants: i32) -> CreateEventRequest {
    CreateEventRequest {
        title: "Riverside cleanup".to_string(),
        organization: "Green Hands".to_string(),
        description: "Collect litter along the river bank".to_string(),
        location: "Long Bien".to_string(),
        event_date,
        category: EventCategory::Environment,
        max_participants,
        hours: 3,
        image_url: None,
    }
}

pub fn subscription(endpoint: &str) -> NewPushSubscription {
    NewPushSubscription {
        endpoint: endpoint.to_string(),
        keys: PushSubscriptionKeys {
            p256dh: BROWSER_PUBLIC_KEY.to_string(),
            auth: BROWSER_AUTH_SECRET.to_string(),
        },
    }
}

/// Signed bearer token for a user, valid for one hour
pub fn bearer_token(user_id: i64, role: Role) -> String {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("Failed to sign test token");
    format!("Bearer {}", token)
}
