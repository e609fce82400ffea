//! In-memory stand-ins for the host capabilities, shared by worker tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use url::Url;

use super::cache::{CacheStore, MemoryCacheStore};
use super::error::{CacheError, NetworkError, PlatformError};
use super::http::{CachedEntry, Request, Response};
use super::network::Network;
use super::platform::{
    Clients, Notification, Notifier, PlatformSubscription, PushManager, SubscriptionKeys, WindowClient,
};
use crate::config::CacheConfig;

/// Serves canned bodies by URL and counts every fetch.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, (StatusCode, String)>>,
    calls: Mutex<HashMap<String, usize>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    /// A network that serves every manifest entry of `config` with 200.
    pub fn serving_manifest(config: &CacheConfig) -> Self {
        let network = Self::default();
        for path in &config.manifest {
            let url = config.resolve(path).unwrap();
            network.serve(url.as_str(), StatusCode::OK, &format!("shell:{path}"));
        }
        network
    }

    pub fn serve(&self, url: &str, status: StatusCode, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.url.to_string())
            .or_default() += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError("offline".to_string()));
        }

        match self.routes.lock().unwrap().get(request.url.as_str()) {
            Some((status, body)) => Ok(Response::new(*status, HeaderMap::new(), body.clone())),
            None => Err(NetworkError(format!("no route for {}", request.url))),
        }
    }
}

/// Records claims, focus and open calls. When given a cache probe, each
/// claim snapshots the bucket names present at that moment.
#[derive(Default)]
pub struct FakeClients {
    windows: Mutex<Vec<WindowClient>>,
    claims: AtomicUsize,
    buckets_at_claim: Mutex<Vec<Vec<String>>>,
    probe: Option<Arc<MemoryCacheStore>>,
    focused: Mutex<Vec<String>>,
    opened: Mutex<Vec<Url>>,
}

impl FakeClients {
    pub fn probing(cache: Arc<MemoryCacheStore>) -> Self {
        Self {
            probe: Some(cache),
            ..Self::default()
        }
    }

    pub fn add_window(&self, id: &str, url: &str) {
        self.windows.lock().unwrap().push(WindowClient {
            id: id.to_string(),
            url: Url::parse(url).unwrap(),
        });
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }

    pub fn buckets_at_claim(&self) -> Vec<Vec<String>> {
        self.buckets_at_claim.lock().unwrap().clone()
    }

    pub fn focused(&self) -> Vec<String> {
        self.focused.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clients for FakeClients {
    async fn claim(&self) -> Result<(), PlatformError> {
        if let Some(cache) = &self.probe {
            let names = cache.bucket_names().await.unwrap();
            self.buckets_at_claim.lock().unwrap().push(names);
        }
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn windows(&self) -> Result<Vec<WindowClient>, PlatformError> {
        Ok(self.windows.lock().unwrap().clone())
    }

    async fn focus(&self, id: &str) -> Result<(), PlatformError> {
        self.focused.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), PlatformError> {
        self.opened.lock().unwrap().push(url.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    shown: Mutex<Vec<Notification>>,
    closed: Mutex<Vec<String>>,
}

impl FakeNotifier {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn show(&self, notification: &Notification) -> Result<String, PlatformError> {
        let mut shown = self.shown.lock().unwrap();
        shown.push(notification.clone());
        Ok(format!("n-{}", shown.len()))
    }

    async fn close(&self, id: &str) -> Result<(), PlatformError> {
        self.closed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePushManager {
    current: Mutex<Option<PlatformSubscription>>,
    last_key: Mutex<Option<Vec<u8>>>,
    issued: AtomicUsize,
}

impl FakePushManager {
    pub fn current_endpoint(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.endpoint.clone())
    }

    pub fn last_key(&self) -> Option<Vec<u8>> {
        self.last_key.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushManager for FakePushManager {
    async fn subscribe(&self, application_server_key: &[u8]) -> Result<PlatformSubscription, PlatformError> {
        *self.last_key.lock().unwrap() = Some(application_server_key.to_vec());
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let subscription = PlatformSubscription {
            endpoint: format!("https://push.example.net/send/{n}"),
            keys: SubscriptionKeys {
                p256dh: format!("p256dh-{n}"),
                auth: format!("auth-{n}"),
            },
        };
        *self.current.lock().unwrap() = Some(subscription.clone());
        Ok(subscription)
    }

    async fn current(&self) -> Result<Option<PlatformSubscription>, PlatformError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn unsubscribe(&self, subscription: &PlatformSubscription) -> Result<(), PlatformError> {
        let mut current = self.current.lock().unwrap();
        if current.as_ref() == Some(subscription) {
            *current = None;
        }
        Ok(())
    }
}

/// Reads succeed against an inner store; single-entry writes always fail.
#[derive(Default)]
pub struct FailingWrites {
    inner: MemoryCacheStore,
    attempts: AtomicUsize,
}

impl FailingWrites {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for FailingWrites {
    async fn bucket_names(&self) -> Result<Vec<String>, CacheError> {
        self.inner.bucket_names().await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        self.inner.delete_bucket(bucket).await
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<CachedEntry>, CacheError> {
        self.inner.get(bucket, url).await
    }

    async fn put(&self, _bucket: &str, _url: &str, _entry: CachedEntry) -> Result<(), CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Write("quota exceeded".to_string()))
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(String, CachedEntry)>) -> Result<(), CacheError> {
        self.inner.put_all(bucket, entries).await
    }
}

/// Reads work normally; single-entry writes never complete.
#[derive(Default)]
pub struct StalledWrites {
    inner: MemoryCacheStore,
}

#[async_trait]
impl CacheStore for StalledWrites {
    async fn bucket_names(&self) -> Result<Vec<String>, CacheError> {
        self.inner.bucket_names().await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        self.inner.delete_bucket(bucket).await
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<CachedEntry>, CacheError> {
        self.inner.get(bucket, url).await
    }

    async fn put(&self, _bucket: &str, _url: &str, _entry: CachedEntry) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(String, CachedEntry)>) -> Result<(), CacheError> {
        self.inner.put_all(bucket, entries).await
    }
}
