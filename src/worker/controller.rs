//! Offline cache orchestration for the portal's background worker.
//!
//! Strategy per request:
//!
//! | request                          | strategy                         |
//! |----------------------------------|----------------------------------|
//! | non-GET or other origin          | untouched pass-through           |
//! | path under the API prefix        | network only                     |
//! | image destination                | cache first, refill on miss      |
//! | anything else                    | network first, cache fallback    |

use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::cache::CacheStore;
use super::error::WorkerError;
use super::http::{CachedEntry, Destination, Request, Response};
use super::network::Network;
use super::platform::Clients;
use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    PassThrough,
    NetworkOnly,
    CacheFirst,
    NetworkFirst,
}

pub struct CacheController {
    config: CacheConfig,
    cache: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    clients: Arc<dyn Clients>,
    background: TaskTracker,
}

impl CacheController {
    pub fn new(
        config: CacheConfig,
        cache: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
        clients: Arc<dyn Clients>,
    ) -> Self {
        Self {
            config,
            cache,
            network,
            clients,
            background: TaskTracker::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Pre-warms the static bucket with the shell manifest. Every asset must
    /// fetch successfully; otherwise nothing is written and install fails.
    pub async fn on_install(&self) -> Result<(), WorkerError> {
        let mut requests = Vec::with_capacity(self.config.manifest.len());
        for path in &self.config.manifest {
            let url = self
                .config
                .resolve(path)
                .map_err(|e| WorkerError::Install(e.to_string()))?;
            requests.push(Request::get(url, Destination::Other));
        }

        let fetched = join_all(requests.iter().map(|request| self.network.fetch(request))).await;

        let mut entries = Vec::with_capacity(fetched.len());
        for (request, result) in requests.iter().zip(fetched) {
            match result {
                Ok(response) if response.is_success() => {
                    entries.push((request.cache_key().to_string(), response.snapshot()));
                }
                Ok(response) => {
                    return Err(WorkerError::Install(format!(
                        "{} returned HTTP {}",
                        request.url,
                        response.status.as_u16()
                    )));
                }
                Err(e) => {
                    return Err(WorkerError::Install(format!("{}: {e}", request.url)));
                }
            }
        }

        let bucket = self.config.static_bucket();
        let count = entries.len();
        self.cache.put_all(&bucket, entries).await?;

        info!(bucket = %bucket, assets = count, "static shell cached");
        Ok(())
    }

    /// Purges every bucket outside the current pair, then claims open pages.
    /// Pages are only claimed once every deletion has settled.
    pub async fn on_activate(&self) -> Result<Vec<String>, WorkerError> {
        let expected = self.config.expected_buckets();
        let stale: Vec<String> = self
            .cache
            .bucket_names()
            .await?
            .into_iter()
            .filter(|name| !expected.contains(name))
            .collect();

        let results = join_all(stale.iter().map(|name| self.cache.delete_bucket(name))).await;
        for (name, result) in stale.iter().zip(results) {
            if let Err(e) = result {
                warn!(bucket = %name, "failed to purge stale bucket: {e}");
                return Err(e.into());
            }
        }

        self.clients.claim().await?;

        info!(version = %self.config.version, purged = stale.len(), "worker activated");
        Ok(stale)
    }

    pub fn strategy_for(&self, request: &Request) -> Strategy {
        if request.method != axum::http::Method::GET
            || request.url.origin() != self.config.origin.origin()
        {
            return Strategy::PassThrough;
        }

        let path = request.url.path();
        let prefix = &self.config.api_prefix;
        if path.starts_with(prefix.as_str()) || path == prefix.trim_end_matches('/') {
            return Strategy::NetworkOnly;
        }

        if request.destination == Destination::Image {
            Strategy::CacheFirst
        } else {
            Strategy::NetworkFirst
        }
    }

    pub async fn on_fetch(&self, request: Request) -> Result<Response, WorkerError> {
        let strategy = self.strategy_for(&request);
        debug!(url = %request.url, ?strategy, "fetch intercepted");

        match strategy {
            Strategy::PassThrough | Strategy::NetworkOnly => {
                Ok(self.network.fetch(&request).await?)
            }
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
        }
    }

    async fn cache_first(&self, request: Request) -> Result<Response, WorkerError> {
        if let Some(entry) = self.lookup(request.cache_key()).await {
            return Ok(entry.to_response());
        }

        let response = self.network.fetch(&request).await?;
        if response.is_success() {
            self.write_behind(request.cache_key(), response.snapshot());
        }
        Ok(response)
    }

    async fn network_first(&self, request: Request) -> Result<Response, WorkerError> {
        match self.network.fetch(&request).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_behind(request.cache_key(), response.snapshot());
                }
                Ok(response)
            }
            Err(network_err) => {
                if let Some(entry) = self.lookup(request.cache_key()).await {
                    debug!(url = %request.url, "network failed, serving cached copy");
                    return Ok(entry.to_response());
                }
                self.offline_page()
                    .await
                    .map(|entry| entry.to_response())
                    .ok_or(WorkerError::Network(network_err))
            }
        }
    }

    /// Latest cached copy of `url`, preferring runtime entries over the shell.
    async fn lookup(&self, url: &str) -> Option<CachedEntry> {
        for bucket in [self.config.dynamic_bucket(), self.config.static_bucket()] {
            match self.cache.get(&bucket, url).await {
                Ok(Some(entry)) => return Some(entry),
                Ok(None) => {}
                Err(e) => warn!(bucket = %bucket, "cache lookup failed: {e}"),
            }
        }
        None
    }

    async fn offline_page(&self) -> Option<CachedEntry> {
        let url = self.config.resolve(&self.config.offline_url).ok()?;
        self.cache
            .get(&self.config.static_bucket(), url.as_str())
            .await
            .unwrap_or_else(|e| {
                warn!("offline page lookup failed: {e}");
                None
            })
    }

    /// Writes into the dynamic bucket on a detached task; the response path
    /// never waits for it and a failure is only logged.
    fn write_behind(&self, url: &str, entry: CachedEntry) {
        let cache = Arc::clone(&self.cache);
        let bucket = self.config.dynamic_bucket();
        let url = url.to_string();

        self.background.spawn(async move {
            if let Err(e) = cache.put(&bucket, &url, entry).await {
                warn!(url = %url, "{e}");
            }
        });
    }

    /// Waits for all outstanding background cache writes.
    pub async fn flush(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }
}
