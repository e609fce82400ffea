//! Fan-out of one message to every registered subscription.
//!
//! Deliveries run concurrently and each is bounded by a timeout, so a batch
//! takes roughly as long as its slowest delivery. The whole batch always
//! settles before the outcome set is inspected: permanent failures prune the
//! subscription, everything else is logged and left for the next broadcast.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::delivery::{DeliveryError, PushSender};
use super::payload::BroadcastMessage;
use super::registry::SubscriptionRegistry;
use crate::error::{Error, Result};
use crate::types::{PushSubscription, Token};

pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    /// Subscriptions a delivery was attempted for.
    pub attempted: usize,
    pub delivered: usize,
    pub pruned: usize,
    pub failed: usize,
}

pub struct BroadcastEngine {
    registry: SubscriptionRegistry,
    sender: Arc<dyn PushSender>,
    delivery_timeout: Duration,
}

impl BroadcastEngine {
    pub fn new(registry: SubscriptionRegistry, sender: Arc<dyn PushSender>) -> Self {
        Self {
            registry,
            sender,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Sends `message` to every subscription. Only operator tokens may
    /// broadcast; any other caller is turned away before the registry is read.
    pub async fn broadcast(
        &self,
        caller: Option<&Token>,
        message: &BroadcastMessage,
    ) -> Result<BroadcastReport> {
        if !caller.is_some_and(|token| token.is_admin) {
            return Err(Error::Unauthorized);
        }

        message.validate()?;

        let subscriptions = self.registry.list_all()?;
        let payload = message.to_payload()?;

        let outcomes = self.deliver_all(&subscriptions, &payload).await;
        let report = self.settle(outcomes);

        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            pruned = report.pruned,
            failed = report.failed,
            "broadcast finished"
        );

        Ok(report)
    }

    async fn deliver_all<'a>(
        &self,
        subscriptions: &'a [PushSubscription],
        payload: &[u8],
    ) -> Vec<(&'a PushSubscription, std::result::Result<(), DeliveryError>)> {
        let deliveries = subscriptions.iter().map(|subscription| async move {
            let outcome =
                match tokio::time::timeout(self.delivery_timeout, self.sender.send(subscription, payload))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(DeliveryError::Transient(format!(
                        "delivery timed out after {}ms",
                        self.delivery_timeout.as_millis()
                    ))),
                };
            (subscription, outcome)
        });

        join_all(deliveries).await
    }

    fn settle(
        &self,
        outcomes: Vec<(&PushSubscription, std::result::Result<(), DeliveryError>)>,
    ) -> BroadcastReport {
        let mut report = BroadcastReport {
            attempted: outcomes.len(),
            ..BroadcastReport::default()
        };

        for (subscription, outcome) in outcomes {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) if e.is_permanent() => match self.registry.remove_stale(subscription) {
                    Ok(true) => {
                        info!(endpoint = %subscription.endpoint, "pruned expired push subscription");
                        report.pruned += 1;
                    }
                    Ok(false) => {
                        warn!(
                            endpoint = %subscription.endpoint,
                            "subscription renewed during broadcast, keeping it: {e}"
                        );
                        report.failed += 1;
                    }
                    Err(remove_err) => {
                        warn!(
                            endpoint = %subscription.endpoint,
                            "failed to prune expired subscription: {remove_err}"
                        );
                        report.failed += 1;
                    }
                },
                Err(e) => {
                    warn!(endpoint = %subscription.endpoint, "push delivery failed: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
