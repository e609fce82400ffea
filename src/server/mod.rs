//! HTTP surface of the registry and broadcast engine.
//!
//! Everything lives under `/api/`, the prefix the worker never caches.

mod admin;
pub mod dto;
mod push;
pub mod response;
mod router;
pub mod validation;

pub use admin::admin_router;
pub use push::push_router;
pub use router::{AppState, create_router};
