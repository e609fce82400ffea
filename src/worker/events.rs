use bytes::Bytes;
use tracing::warn;
use url::Url;

use super::controller::CacheController;
use super::error::WorkerError;
use super::http::{Request, Response};
use super::notification::{NotificationClick, NotificationRenderer};

/// Lifecycle and functional events the host dispatches to the worker.
#[derive(Debug)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(Option<Bytes>),
    NotificationClick(NotificationClick),
}

#[derive(Debug)]
pub enum EventOutcome {
    Installed,
    Activated { purged: Vec<String> },
    Responded(Response),
    Shown { notification_id: String },
    Navigated(Url),
}

/// One worker instance: the cache controller plus the notification side.
pub struct ServiceWorker {
    controller: CacheController,
    renderer: NotificationRenderer,
}

impl ServiceWorker {
    pub fn new(controller: CacheController, renderer: NotificationRenderer) -> Self {
        Self {
            controller,
            renderer,
        }
    }

    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    /// Routes an event to its handler. The returned future settles only when
    /// the handler's work is done, which is what keeps the host from
    /// terminating the worker early.
    pub async fn handle(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => {
                self.controller.on_install().await?;
                Ok(EventOutcome::Installed)
            }
            WorkerEvent::Activate => {
                let purged = self.controller.on_activate().await?;
                Ok(EventOutcome::Activated { purged })
            }
            WorkerEvent::Fetch(request) => {
                let response = self.controller.on_fetch(request).await?;
                Ok(EventOutcome::Responded(response))
            }
            WorkerEvent::Push(payload) => {
                let notification_id = self
                    .renderer
                    .on_push_event(payload.as_deref())
                    .await
                    .inspect_err(|e| warn!("failed to show push notification: {e}"))?;
                Ok(EventOutcome::Shown { notification_id })
            }
            WorkerEvent::NotificationClick(click) => {
                let target = self.renderer.on_notification_click(&click).await?;
                Ok(EventOutcome::Navigated(target))
            }
        }
    }
}
