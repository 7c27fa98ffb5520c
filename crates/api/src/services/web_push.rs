//! Web Push delivery (RFC 8030) with VAPID authorization (RFC 8292).
//!
//! Implements the PushSender trait. The JSON message is encrypted for the
//! subscription's keys with the aes128gcm content coding (RFC 8291).

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use domain::models::NotificationEndpoint;
use domain::services::{DeliveryOutcome, PushMessage, PushSender};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;

use crate::config::PushConfig;
use crate::services::auth::normalize_pem_key;

/// VAPID tokens are valid for at most 24 hours; renew well before that.
const VAPID_TOKEN_LIFETIME_SECS: i64 = 12 * 3600;
const VAPID_RENEW_MARGIN_SECS: i64 = 300;

/// VAPID JWT claims.
#[derive(Debug, Serialize)]
struct VapidClaims {
    aud: String,
    exp: i64,
    sub: String,
}

/// Signed VAPID token for one push service origin.
#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Error type for Web Push setup and requests.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Invalid VAPID private key: {0}")]
    InvalidKey(String),

    #[error("Invalid push endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to sign VAPID token: {0}")]
    Signing(String),

    #[error("Failed to encrypt push payload: {0}")]
    Encryption(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Web Push is not enabled")]
    NotEnabled,
}

/// Maps a push service response status to a delivery outcome.
pub fn classify_status(status: StatusCode) -> DeliveryOutcome {
    match status {
        s if s.is_success() => DeliveryOutcome::Delivered,
        StatusCode::NOT_FOUND | StatusCode::GONE => DeliveryOutcome::Gone,
        s => DeliveryOutcome::Failed(format!("Push service returned {}", s)),
    }
}

/// Origin of an endpoint URL, used as the VAPID audience.
pub fn audience_for(endpoint: &str) -> Result<String, PushError> {
    let url = Url::parse(endpoint).map_err(|e| PushError::InvalidEndpoint(e.to_string()))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(PushError::InvalidEndpoint(format!(
            "Unsupported scheme: {}",
            url.scheme()
        )));
    }
    Ok(url.origin().ascii_serialization())
}

/// Encrypts a message for an endpoint's `p256dh` key and `auth` secret.
///
/// The result is a complete aes128gcm body, header block included.
pub fn encrypt_payload(
    endpoint: &NotificationEndpoint,
    message: &PushMessage,
) -> Result<Vec<u8>, PushError> {
    let p256dh = decode_key(&endpoint.p256dh)
        .map_err(|e| PushError::Encryption(format!("p256dh: {}", e)))?;
    let auth = decode_key(&endpoint.auth)
        .map_err(|e| PushError::Encryption(format!("auth: {}", e)))?;
    let plaintext =
        serde_json::to_vec(message).map_err(|e| PushError::Encryption(e.to_string()))?;

    ece::encrypt(&p256dh, &auth, &plaintext).map_err(|e| PushError::Encryption(e.to_string()))
}

/// Browsers hand out unpadded base64url keys; tolerate padding anyway.
fn decode_key(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(value.trim_end_matches('='))
}

/// Web Push sender backed by reqwest.
pub struct WebPushSender {
    client: Client,
    encoding_key: EncodingKey,
    public_key: String,
    subject: String,
    ttl_secs: u32,
    /// Signed tokens keyed by audience.
    token_cache: RwLock<HashMap<String, CachedToken>>,
}

impl WebPushSender {
    /// Create a new Web Push sender.
    ///
    /// # Errors
    /// Returns an error if push is disabled or the VAPID key cannot be parsed.
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        if !config.enabled {
            return Err(PushError::NotEnabled);
        }

        let private_key = normalize_pem_key(&config.vapid_private_key);
        let encoding_key = EncodingKey::from_ec_pem(private_key.as_bytes())
            .map_err(|e| PushError::InvalidKey(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            encoding_key,
            public_key: config.vapid_public_key.clone(),
            subject: config.vapid_subject.clone(),
            ttl_secs: config.ttl_secs,
            token_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Returns a VAPID token for the audience, signing a new one when the cached one is stale.
    fn vapid_token(&self, audience: &str) -> Result<String, PushError> {
        let now = Utc::now().timestamp();

        {
            let cache = self.token_cache.read().unwrap_or_else(|p| p.into_inner());
            if let Some(cached) = cache.get(audience) {
                if cached.expires_at - VAPID_RENEW_MARGIN_SECS > now {
                    return Ok(cached.token.clone());
                }
            }
        }

        let claims = VapidClaims {
            aud: audience.to_string(),
            exp: now + VAPID_TOKEN_LIFETIME_SECS,
            sub: self.subject.clone(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.encoding_key)
            .map_err(|e| PushError::Signing(e.to_string()))?;

        self.token_cache
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(
                audience.to_string(),
                CachedToken {
                    token: token.clone(),
                    expires_at: claims.exp,
                },
            );

        Ok(token)
    }

    /// `Authorization` header value for an endpoint.
    fn authorization(&self, endpoint: &str) -> Result<String, PushError> {
        let audience = audience_for(endpoint)?;
        let token = self.vapid_token(&audience)?;
        Ok(format!("vapid t={}, k={}", token, self.public_key))
    }

    async fn post(
        &self,
        endpoint: &NotificationEndpoint,
        message: &PushMessage,
    ) -> Result<StatusCode, PushError> {
        let authorization = self.authorization(&endpoint.endpoint)?;
        let body = encrypt_payload(endpoint, message)?;

        let response = self
            .client
            .post(&endpoint.endpoint)
            .header("Authorization", authorization)
            .header("TTL", self.ttl_secs.to_string())
            .header("Urgency", "normal")
            .header("Content-Encoding", "aes128gcm")
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await?;

        Ok(response.status())
    }
}

#[async_trait::async_trait]
impl PushSender for WebPushSender {
    async fn send(&self, endpoint: &NotificationEndpoint, message: &PushMessage) -> DeliveryOutcome {
        match self.post(endpoint, message).await {
            Ok(status) => {
                let outcome = classify_status(status);
                tracing::debug!(
                    endpoint_id = %endpoint.id,
                    status = status.as_u16(),
                    title = %message.title,
                    outcome = outcome.label(),
                    "Web Push response"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    endpoint_id = %endpoint.id,
                    error = %e,
                    "Web Push request failed"
                );
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}
