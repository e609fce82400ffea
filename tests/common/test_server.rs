use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::MockServer;

use herald::auth::TokenGenerator;
use herald::push::{BroadcastEngine, SubscriptionRegistry, VapidKeys, WebPushSender};
use herald::server::{AppState, create_router};
use herald::store::{SqliteStore, Store};

/// A herald server running in-process on an ephemeral port, with a mock
/// push service standing in for the browsers' push endpoints.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
    pub vapid_public_key: String,
    pub push_service: MockServer,
    pub store: Arc<dyn Store>,
    server_task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("herald.db")).expect("open store");
        store.initialize().expect("initialize store");
        let store: Arc<dyn Store> = Arc::new(store);

        let (admin, admin_token) = TokenGenerator::new()
            .issue(true, None, None)
            .expect("issue admin token");
        store.create_token(&admin).expect("store admin token");

        let keys = VapidKeys::generate();
        let sender = WebPushSender::new(
            reqwest::Client::new(),
            keys.private_key(),
            "mailto:test@example.com",
            60,
        );
        let engine = BroadcastEngine::new(SubscriptionRegistry::new(store.clone()), Arc::new(sender))
            .with_delivery_timeout(Duration::from_secs(5));

        let state = Arc::new(AppState {
            store: store.clone(),
            engine: Arc::new(engine),
            vapid_public_key: keys.public_key().to_string(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let app = create_router(state);
        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://127.0.0.1:{port}"),
            admin_token,
            vapid_public_key: keys.public_key().to_string(),
            push_service: MockServer::start().await,
            store,
            server_task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issues a reader token tied to `user_id`.
    pub fn reader_token(&self, user_id: &str) -> String {
        let (token, raw) = TokenGenerator::new()
            .issue(false, Some(user_id.to_string()), None)
            .expect("issue reader token");
        self.store.create_token(&token).expect("store reader token");
        raw
    }

    /// Exchange JSON for a browser subscription whose endpoint lives on the
    /// mock push service, with real P-256 and auth key material.
    pub fn browser_subscription(&self, endpoint_path: &str) -> Value {
        let browser_key = p256::ecdsa::SigningKey::random(&mut OsRng);
        let point = browser_key.verifying_key().to_encoded_point(false);
        let mut auth = [0u8; 16];
        OsRng.fill_bytes(&mut auth);

        json!({
            "endpoint": format!("{}{}", self.push_service.uri(), endpoint_path),
            "expirationTime": null,
            "keys": {
                "p256dh": BASE64URL.encode(point.as_bytes()),
                "auth": BASE64URL.encode(auth),
            }
        })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}
