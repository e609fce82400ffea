use thiserror::Error;

/// A fetch that produced no response at all (offline, DNS, reset).
#[derive(Debug, Clone, Error)]
#[error("network error: {0}")]
pub struct NetworkError(pub String);

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache read failed: {0}")]
    Read(String),

    /// Non-fatal on the fetch path: logged and swallowed.
    #[error("cache write failed: {0}")]
    Write(String),

    #[error("cache delete failed: {0}")]
    Delete(String),
}

/// Failure reported by a host capability (clients, notifications, push manager).
#[derive(Debug, Clone, Error)]
#[error("platform error: {0}")]
pub struct PlatformError(pub String);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("install failed: {0}")]
    Install(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
