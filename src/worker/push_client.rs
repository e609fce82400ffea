//! Page-side subscription lifecycle: ask the browser for a push
//! subscription and mirror it into the server registry.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::error::PlatformError;
use super::platform::{PlatformSubscription, PushManager};
use crate::push::decode_public_key;

#[derive(Debug, Error)]
pub enum PushClientError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("registry request failed: {0}")]
    Registry(String),

    #[error("invalid application server key: {0}")]
    InvalidKey(String),
}

/// The subset of the server API the page needs.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn vapid_public_key(&self) -> Result<String, PushClientError>;
    async fn register(&self, subscription: &PlatformSubscription) -> Result<(), PushClientError>;
    async fn unregister(&self, endpoint: &str) -> Result<(), PushClientError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct VapidKeyBody {
    public_key: String,
}

pub struct HttpRegistryClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpRegistryClient {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            token: None,
        }
    }

    /// Attaches the signed-in reader's token so subscriptions carry a user id.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> Result<Url, PushClientError> {
        self.base_url
            .join(path)
            .map_err(|e| PushClientError::Registry(e.to_string()))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PushClientError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(PushClientError::Registry(format!("HTTP {status}: {body}")))
    }
}

#[async_trait]
impl RegistryApi for HttpRegistryClient {
    async fn vapid_public_key(&self) -> Result<String, PushClientError> {
        let response = self
            .client
            .get(self.url("/api/v1/push/vapid-public-key")?)
            .send()
            .await
            .map_err(|e| PushClientError::Registry(e.to_string()))?;

        let body: Envelope<VapidKeyBody> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| PushClientError::Registry(e.to_string()))?;
        Ok(body.data.public_key)
    }

    async fn register(&self, subscription: &PlatformSubscription) -> Result<(), PushClientError> {
        let request = self
            .client
            .post(self.url("/api/v1/push/subscriptions")?)
            .json(subscription);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PushClientError::Registry(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn unregister(&self, endpoint: &str) -> Result<(), PushClientError> {
        let request = self
            .client
            .delete(self.url("/api/v1/push/subscriptions")?)
            .json(&serde_json::json!({ "endpoint": endpoint }));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PushClientError::Registry(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }
}

pub struct PushClient {
    push_manager: Arc<dyn PushManager>,
    registry: Arc<dyn RegistryApi>,
}

impl PushClient {
    pub fn new(push_manager: Arc<dyn PushManager>, registry: Arc<dyn RegistryApi>) -> Self {
        Self {
            push_manager,
            registry,
        }
    }

    /// Subscribes the browser and registers the result with the server.
    ///
    /// If registration fails the local subscription is undone, so the page
    /// never believes it is subscribed when the server does not.
    pub async fn subscribe(&self) -> Result<PlatformSubscription, PushClientError> {
        let public_key = self.registry.vapid_public_key().await?;
        let key = decode_public_key(&public_key)
            .map_err(|e| PushClientError::InvalidKey(e.to_string()))?;

        let subscription = self.push_manager.subscribe(&key).await?;

        if let Err(e) = self.registry.register(&subscription).await {
            warn!(endpoint = %subscription.endpoint, "registration failed, rolling back: {e}");
            if let Err(rollback) = self.push_manager.unsubscribe(&subscription).await {
                warn!("local unsubscribe after failed registration also failed: {rollback}");
            }
            return Err(e);
        }

        info!(endpoint = %subscription.endpoint, "push subscription registered");
        Ok(subscription)
    }

    /// Removes the server record first, then the local subscription.
    /// Returns false when the browser had no subscription to begin with.
    ///
    /// A failed server call leaves the local subscription in place, so the
    /// page can retry without ending up with an orphaned server record.
    pub async fn unsubscribe(&self) -> Result<bool, PushClientError> {
        let Some(subscription) = self.push_manager.current().await? else {
            return Ok(false);
        };

        self.registry.unregister(&subscription.endpoint).await?;
        self.push_manager.unsubscribe(&subscription).await?;

        info!(endpoint = %subscription.endpoint, "push subscription removed");
        Ok(true)
    }
}
