mod broadcast;
mod subscriptions;
mod tokens;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/broadcast", post(broadcast::broadcast))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/tokens", get(tokens::list_tokens))
        .route("/tokens", post(tokens::create_token))
        .route("/tokens/{id}", delete(tokens::delete_token))
}
