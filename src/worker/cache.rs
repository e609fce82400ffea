use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::CacheError;
use super::http::CachedEntry;

/// Named cache buckets of GET responses keyed by URL.
///
/// Implementations must tolerate concurrent reads and writes from
/// independent fetch events.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn bucket_names(&self) -> Result<Vec<String>, CacheError>;

    /// Drops a bucket and every entry in it. Returns false if it did not exist.
    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError>;

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<CachedEntry>, CacheError>;

    /// Stores an entry, creating the bucket on first use and overwriting any
    /// previous entry for the URL.
    async fn put(&self, bucket: &str, url: &str, entry: CachedEntry) -> Result<(), CacheError>;

    /// Stores every entry or none of them.
    async fn put_all(&self, bucket: &str, entries: Vec<(String, CachedEntry)>) -> Result<(), CacheError>;
}

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    buckets: RwLock<HashMap<String, HashMap<String, CachedEntry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(bucket)
            .map_or(0, HashMap::len)
    }

    /// Creates an empty bucket, as a previous deployment would have left behind.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(bucket.to_string())
            .or_default();
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn bucket_names(&self) -> Result<Vec<String>, CacheError> {
        let buckets = self.buckets.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = buckets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        Ok(buckets.remove(bucket).is_some())
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<CachedEntry>, CacheError> {
        let buckets = self.buckets.read().unwrap_or_else(|e| e.into_inner());
        Ok(buckets.get(bucket).and_then(|entries| entries.get(url)).cloned())
    }

    async fn put(&self, bucket: &str, url: &str, entry: CachedEntry) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(url.to_string(), entry);
        Ok(())
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(String, CachedEntry)>) -> Result<(), CacheError> {
        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        buckets.entry(bucket.to_string()).or_default().extend(entries);
        Ok(())
    }
}
