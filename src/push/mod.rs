//! Server half of breaking-news push delivery.
//!
//! ```text
//! operator -> BroadcastEngine -> SubscriptionRegistry (read all)
//!                  |
//!                  +-> PushSender (one per subscription, concurrent)
//!                          -> push service -> browser worker
//! ```

mod broadcast;
mod delivery;
mod payload;
mod registry;
mod vapid;

pub use broadcast::{BroadcastEngine, BroadcastReport, DEFAULT_DELIVERY_TIMEOUT};
pub use delivery::{DeliveryError, PushSender, WebPushSender, classify_status};
pub use payload::{BroadcastMessage, DEFAULT_TITLE};
pub use registry::{DEFAULT_LIST_PAGE_SIZE, SubscriptionRegistry};
pub use vapid::{PUBLIC_KEY_LEN, VapidKeys, decode_public_key};
