//! Single-subscription Web Push delivery (RFC 8030).
//!
//! Payload encryption (RFC 8291) and the VAPID JWT are produced by the
//! `web-push` crate; the HTTP request itself goes out through `reqwest`.

use async_trait::async_trait;
use thiserror::Error;
use web_push::{ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder};

use crate::types::PushSubscription;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The push service no longer knows the endpoint; the row should be pruned.
    #[error("endpoint gone (HTTP {status})")]
    Permanent { status: u16 },

    #[error("transient delivery failure: {0}")]
    Transient(String),
}

impl DeliveryError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryError::Permanent { .. })
    }
}

/// Maps a push-service response status to a delivery outcome.
pub fn classify_status(status: u16) -> Result<(), DeliveryError> {
    match status {
        200..=299 => Ok(()),
        404 | 410 => Err(DeliveryError::Permanent { status }),
        429 => Err(DeliveryError::Transient("rate limited (HTTP 429)".to_string())),
        _ => Err(DeliveryError::Transient(format!("push service returned HTTP {status}"))),
    }
}

/// Delivers one encrypted payload to one subscription.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &[u8]) -> Result<(), DeliveryError>;
}

pub struct WebPushSender {
    client: reqwest::Client,
    vapid_private_key: String,
    subject: String,
    ttl: u32,
}

impl WebPushSender {
    pub fn new(
        client: reqwest::Client,
        vapid_private_key: impl Into<String>,
        subject: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            client,
            vapid_private_key: vapid_private_key.into(),
            subject: subject.into(),
            ttl,
        }
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(&self, subscription: &PushSubscription, payload: &[u8]) -> Result<(), DeliveryError> {
        let sub_info =
            SubscriptionInfo::new(&subscription.endpoint, &subscription.p256dh, &subscription.auth);

        let mut sig_builder = VapidSignatureBuilder::from_base64(&self.vapid_private_key, &sub_info)
            .map_err(|e| DeliveryError::Transient(format!("failed to build VAPID signature: {e}")))?;
        sig_builder.add_claim("sub", self.subject.as_str());
        let signature = sig_builder
            .build()
            .map_err(|e| DeliveryError::Transient(format!("failed to sign VAPID JWT: {e}")))?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(self.ttl);

        // Malformed subscriber keys surface here, before any network I/O.
        let message = builder
            .build()
            .map_err(|e| DeliveryError::Transient(format!("failed to encrypt payload: {e}")))?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(format!("push request failed: {e}")))?;

        classify_status(response.status().as_u16())
    }
}
