//! Browser half of the portal: the background worker and the page-side
//! push client.
//!
//! Host capabilities (cache storage, network, open windows, notifications,
//! the browser push manager) sit behind traits so the same logic runs
//! against a real host binding or the in-memory fakes used in tests.

mod cache;
mod controller;
mod error;
mod events;
mod http;
mod network;
mod notification;
mod platform;
mod push_client;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStore, MemoryCacheStore};
pub use controller::{CacheController, Strategy};
pub use error::{CacheError, NetworkError, PlatformError, WorkerError};
pub use events::{EventOutcome, ServiceWorker, WorkerEvent};
pub use http::{CachedEntry, Destination, Request, Response};
pub use network::{HttpNetwork, Network};
pub use notification::{NotificationClick, NotificationRenderer};
pub use platform::{
    Clients, Notification, Notifier, PlatformSubscription, PushManager, SubscriptionKeys, WindowClient,
};
pub use push_client::{HttpRegistryClient, PushClient, PushClientError, RegistryApi};
