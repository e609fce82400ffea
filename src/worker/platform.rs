//! Host capabilities the worker relies on but does not implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: Url,
}

/// Open pages controlled (or controllable) by the worker.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Takes control of every open page in scope.
    async fn claim(&self) -> Result<(), PlatformError>;
    async fn windows(&self) -> Result<Vec<WindowClient>, PlatformError>;
    async fn focus(&self, id: &str) -> Result<(), PlatformError>;
    async fn open_window(&self, url: &Url) -> Result<(), PlatformError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    /// Page opened when the notification is clicked.
    pub url: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Resolves once the system notification is on screen; returns its id.
    async fn show(&self, notification: &Notification) -> Result<String, PlatformError>;
    async fn close(&self, id: &str) -> Result<(), PlatformError>;
}

/// A subscription as issued by the browser's push manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[async_trait]
pub trait PushManager: Send + Sync {
    async fn subscribe(&self, application_server_key: &[u8]) -> Result<PlatformSubscription, PlatformError>;
    async fn current(&self) -> Result<Option<PlatformSubscription>, PlatformError>;
    async fn unsubscribe(&self, subscription: &PlatformSubscription) -> Result<(), PlatformError>;
}
