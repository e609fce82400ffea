//! # Herald
//!
//! Offline caching and breaking-news push delivery for a news portal.
//!
//! The crate has two halves that meet at the push service:
//!
//! - [`server`], [`push`] and [`store`]: the HTTP registry of browser
//!   subscriptions and the broadcast engine that fans an alert out to them.
//! - [`worker`]: the browser-side background worker (offline cache, push
//!   notifications) and the page-side push client, written against host
//!   capability traits.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! herald = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use herald::push::{BroadcastEngine, SubscriptionRegistry, VapidKeys, WebPushSender};
//! use herald::server::{AppState, create_router};
//! use herald::store::{SqliteStore, Store};
//!
//! let store: Arc<dyn Store> = Arc::new(SqliteStore::new("./data/herald.db")?);
//! store.initialize()?;
//!
//! let keys = VapidKeys::load("./data/vapid.json")?;
//! let sender = WebPushSender::new(
//!     reqwest::Client::new(),
//!     keys.private_key(),
//!     "mailto:newsroom@example.com",
//!     86_400,
//! );
//! let engine = BroadcastEngine::new(SubscriptionRegistry::new(store.clone()), Arc::new(sender));
//!
//! let router = create_router(Arc::new(AppState {
//!     store,
//!     engine: Arc::new(engine),
//!     vapid_public_key: keys.public_key().to_string(),
//! }));
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod push;
pub mod server;
pub mod store;
pub mod types;
pub mod worker;
