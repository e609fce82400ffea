use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use super::error::PlatformError;
use super::platform::{Clients, Notification, Notifier};
use crate::push::DEFAULT_TITLE;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushPayload {
    title: String,
    body: String,
    icon: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationClick {
    pub notification_id: String,
    pub url: Option<String>,
}

/// Turns push payloads into system notifications and clicks into windows.
pub struct NotificationRenderer {
    origin: Url,
    notifier: Arc<dyn Notifier>,
    clients: Arc<dyn Clients>,
}

impl NotificationRenderer {
    pub fn new(origin: Url, notifier: Arc<dyn Notifier>, clients: Arc<dyn Clients>) -> Self {
        Self {
            origin,
            notifier,
            clients,
        }
    }

    /// Parses a push payload and shows it. A missing or unreadable payload
    /// still produces a generic alert rather than a silent push.
    pub fn parse(payload: Option<&[u8]>) -> Notification {
        let parsed = match payload {
            Some(bytes) => serde_json::from_slice::<PushPayload>(bytes).unwrap_or_else(|e| {
                warn!("unreadable push payload: {e}");
                PushPayload {
                    body: String::from_utf8_lossy(bytes).into_owned(),
                    ..PushPayload::default()
                }
            }),
            None => PushPayload::default(),
        };

        let title = if parsed.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            parsed.title
        };

        Notification {
            title,
            body: parsed.body,
            icon: parsed.icon,
            url: parsed.url,
        }
    }

    /// Resolves only after the notification is shown, which keeps the worker
    /// alive for as long as the host awaits it.
    pub async fn on_push_event(&self, payload: Option<&[u8]>) -> Result<String, PlatformError> {
        let notification = Self::parse(payload);
        self.notifier.show(&notification).await
    }

    /// Closes the notification, then focuses a window already showing the
    /// target page or opens a new one.
    pub async fn on_notification_click(&self, click: &NotificationClick) -> Result<Url, PlatformError> {
        self.notifier.close(&click.notification_id).await?;

        let target = self
            .origin
            .join(click.url.as_deref().unwrap_or("/"))
            .map_err(|e| PlatformError(format!("invalid notification url: {e}")))?;

        let windows = self.clients.windows().await?;
        match windows.iter().find(|w| w.url == target) {
            Some(window) => self.clients.focus(&window.id).await?,
            None => self.clients.open_window(&target).await?,
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{FakeClients, FakeNotifier};

    fn renderer() -> (NotificationRenderer, Arc<FakeNotifier>, Arc<FakeClients>) {
        let notifier = Arc::new(FakeNotifier::default());
        let clients = Arc::new(FakeClients::default());
        let renderer = NotificationRenderer::new(
            Url::parse("https://news.example.com").unwrap(),
            notifier.clone(),
            clients.clone(),
        );
        (renderer, notifier, clients)
    }

    #[tokio::test]
    async fn test_push_shows_notification_with_url() {
        let (renderer, notifier, _) = renderer();

        renderer
            .on_push_event(Some(
                br#"{"title":"Breaking","body":"Bridge closed","url":"/articles/9"}"#,
            ))
            .await
            .unwrap();

        let shown = notifier.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Breaking");
        assert_eq!(shown[0].body, "Bridge closed");
        assert_eq!(shown[0].url.as_deref(), Some("/articles/9"));
    }

    #[test]
    fn test_parse_falls_back_for_missing_fields() {
        let notification = NotificationRenderer::parse(None);
        assert_eq!(notification.title, DEFAULT_TITLE);
        assert!(notification.url.is_none());

        let plain = NotificationRenderer::parse(Some(b"plain text alert"));
        assert_eq!(plain.title, DEFAULT_TITLE);
        assert_eq!(plain.body, "plain text alert");
    }

    #[tokio::test]
    async fn test_click_closes_then_opens_window() {
        let (renderer, notifier, clients) = renderer();

        let target = renderer
            .on_notification_click(&NotificationClick {
                notification_id: "n-1".to_string(),
                url: Some("/articles/9".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(target.as_str(), "https://news.example.com/articles/9");
        assert_eq!(notifier.closed(), ["n-1"]);
        assert_eq!(clients.opened(), [target]);
        assert!(clients.focused().is_empty());
    }

    #[tokio::test]
    async fn test_click_focuses_existing_window() {
        let (renderer, _, clients) = renderer();
        clients.add_window("w-1", "https://news.example.com/articles/9");

        renderer
            .on_notification_click(&NotificationClick {
                notification_id: "n-1".to_string(),
                url: Some("/articles/9".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(clients.focused(), ["w-1"]);
        assert!(clients.opened().is_empty());
    }

    #[tokio::test]
    async fn test_click_without_url_opens_home() {
        let (renderer, _, clients) = renderer();

        renderer
            .on_notification_click(&NotificationClick {
                notification_id: "n-2".to_string(),
                url: None,
            })
            .await
            .unwrap();

        assert_eq!(clients.opened()[0].as_str(), "https://news.example.com/");
    }
}
