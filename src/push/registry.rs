use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::PushSubscription;

pub const DEFAULT_LIST_PAGE_SIZE: i32 = 500;

/// Durable mapping from push endpoint to delivery keys.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn Store>,
    page_size: i32,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Inserts a subscription, or overwrites keys, owner and `created_at` when
    /// the endpoint is already registered. Browsers re-issue fresh keys for the
    /// same endpoint, so the endpoint is the identity.
    pub fn upsert(
        &self,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
        user_id: Option<&str>,
    ) -> Result<PushSubscription> {
        let endpoint = endpoint.trim();
        let p256dh = p256dh.trim();
        let auth = auth.trim();

        if endpoint.is_empty() || p256dh.is_empty() || auth.is_empty() {
            return Err(Error::Validation(
                "subscription requires endpoint, keys.p256dh and keys.auth".to_string(),
            ));
        }

        let subscription = PushSubscription {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.map(str::to_string),
            endpoint: endpoint.to_string(),
            p256dh: p256dh.to_string(),
            auth: auth.to_string(),
            created_at: Utc::now(),
        };

        let stored = self.store.upsert_subscription(&subscription)?;
        tracing::debug!(endpoint = %stored.endpoint, "push subscription stored");
        Ok(stored)
    }

    /// Removes the subscription for `endpoint`. Unknown endpoints are not an error.
    pub fn remove(&self, endpoint: &str) -> Result<bool> {
        self.store.delete_subscription(endpoint.trim())
    }

    /// Removes `subscription` only if its endpoint still carries the same keys.
    /// A browser that re-subscribed since the row was read keeps its new row.
    pub fn remove_stale(&self, subscription: &PushSubscription) -> Result<bool> {
        self.store.delete_subscription_if_keys(
            &subscription.endpoint,
            &subscription.p256dh,
            &subscription.auth,
        )
    }

    pub fn get(&self, endpoint: &str) -> Result<Option<PushSubscription>> {
        self.store.get_subscription_by_endpoint(endpoint)
    }

    /// One page of subscriptions ordered by endpoint, starting after `cursor`.
    pub fn list_page(&self, cursor: &str, limit: i32) -> Result<Vec<PushSubscription>> {
        self.store.list_subscriptions(cursor, limit)
    }

    /// Every registered subscription, read in pages.
    pub fn list_all(&self) -> Result<Vec<PushSubscription>> {
        let mut all = Vec::new();
        let mut cursor = String::new();

        loop {
            let page = self.store.list_subscriptions(&cursor, self.page_size)?;
            let page_len = page.len();

            if let Some(last) = page.last() {
                cursor = last.endpoint.clone();
            }
            all.extend(page);

            if page_len < self.page_size as usize {
                break;
            }
        }

        Ok(all)
    }

    pub fn count(&self) -> Result<i64> {
        self.store.count_subscriptions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn registry() -> SubscriptionRegistry {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        SubscriptionRegistry::new(Arc::new(store))
    }

    #[test]
    fn test_upsert_requires_all_fields() {
        let registry = registry();

        for (endpoint, p256dh, auth) in [
            ("", "k", "a"),
            ("https://push/1", "", "a"),
            ("https://push/1", "k", "  "),
        ] {
            let result = registry.upsert(endpoint, p256dh, auth, None);
            assert!(matches!(result, Err(Error::Validation(_))));
        }
        assert_eq!(registry.count().unwrap(), 0);
    }

    #[test]
    fn test_resubscribe_replaces_keys() {
        let registry = registry();

        registry.upsert("https://push/e1", "k1", "a1", None).unwrap();
        registry.upsert("https://push/e1", "k2", "a2", Some("reader-7")).unwrap();

        let all = registry.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].p256dh, "k2");
        assert_eq!(all[0].auth, "a2");
        assert_eq!(all[0].user_id.as_deref(), Some("reader-7"));
    }

    #[test]
    fn test_remove_unknown_endpoint_is_ok() {
        let registry = registry();
        assert!(!registry.remove("https://push/never").unwrap());
    }

    #[test]
    fn test_list_all_crosses_page_boundaries() {
        let registry = registry().with_page_size(2);

        for i in 0..5 {
            registry
                .upsert(&format!("https://push/{i}"), "k", "a", None)
                .unwrap();
        }

        let all = registry.list_all().unwrap();
        assert_eq!(all.len(), 5);
        let endpoints: Vec<&str> = all.iter().map(|s| s.endpoint.as_str()).collect();
        assert_eq!(
            endpoints,
            ["https://push/0", "https://push/1", "https://push/2", "https://push/3", "https://push/4"]
        );
    }
}
