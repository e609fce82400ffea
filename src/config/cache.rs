use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Cache layout for one deployed version of the offline worker.
///
/// Bucket names encode the version, so bumping `version` makes every bucket
/// from the previous deployment stale at the next activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Origin the worker is scoped to; requests for other origins pass through.
    pub origin: Url,
    pub version: String,
    #[serde(default = "default_prefix")]
    pub bucket_prefix: String,
    /// Shell assets pre-warmed into the static bucket at install.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,
    /// Requests under this path prefix are always sent to the network.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_offline_url")]
    pub offline_url: String,
}

fn default_prefix() -> String {
    "herald".to_string()
}

fn default_manifest() -> Vec<String> {
    vec![
        "/".to_string(),
        "/manifest.json".to_string(),
        "/logo.png".to_string(),
        "/offline.html".to_string(),
    ]
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_offline_url() -> String {
    "/offline.html".to_string()
}

impl CacheConfig {
    pub fn new(origin: Url, version: impl Into<String>) -> Self {
        Self {
            origin,
            version: version.into(),
            bucket_prefix: default_prefix(),
            manifest: default_manifest(),
            api_prefix: default_api_prefix(),
            offline_url: default_offline_url(),
        }
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid worker config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::Config("cache version cannot be empty".to_string()));
        }
        if !self.offline_url.starts_with('/') {
            return Err(Error::Config(
                "offline_url must be a path on the worker origin".to_string(),
            ));
        }
        if !self.manifest.iter().any(|u| u == &self.offline_url) {
            return Err(Error::Config(
                "manifest must include the offline fallback page".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn static_bucket(&self) -> String {
        format!("{}-static-{}", self.bucket_prefix, self.version)
    }

    #[must_use]
    pub fn dynamic_bucket(&self) -> String {
        format!("{}-dynamic-{}", self.bucket_prefix, self.version)
    }

    /// The only bucket names allowed to survive activation.
    #[must_use]
    pub fn expected_buckets(&self) -> [String; 2] {
        [self.static_bucket(), self.dynamic_bucket()]
    }

    /// Resolves a manifest path against the worker origin.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.origin
            .join(path)
            .map_err(|e| Error::Config(format!("invalid asset path '{path}': {e}")))
    }
}
