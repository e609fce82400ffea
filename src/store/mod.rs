mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Push subscription operations (keyed by endpoint)
    fn upsert_subscription(&self, sub: &PushSubscription) -> Result<PushSubscription>;
    fn get_subscription_by_endpoint(&self, endpoint: &str) -> Result<Option<PushSubscription>>;
    fn list_subscriptions(&self, cursor: &str, limit: i32) -> Result<Vec<PushSubscription>>;
    fn delete_subscription(&self, endpoint: &str) -> Result<bool>;
    /// Deletes the row only while it still holds these keys.
    fn delete_subscription_if_keys(&self, endpoint: &str, p256dh: &str, auth: &str) -> Result<bool>;
    fn count_subscriptions(&self) -> Result<i64>;

    // Admin token check
    fn has_admin_token(&self) -> Result<bool>;
}
