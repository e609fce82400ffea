use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::auth::OptionalAuth;
use crate::server::AppState;
use crate::server::dto::{SubscribeRequest, UnsubscribeRequest, VapidKeyResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::{validate_endpoint, validate_subscription_key};

pub fn push_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vapid-public-key", get(vapid_public_key))
        .route(
            "/subscriptions",
            post(subscribe).delete(unsubscribe),
        )
}

async fn vapid_public_key(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::success(VapidKeyResponse {
        public_key: state.vapid_public_key.clone(),
    }))
}

/// Registers a browser subscription. Anonymous readers are welcome; a
/// reader token, when presented, ties the subscription to that user.
async fn subscribe(
    OptionalAuth(token): OptionalAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> impl IntoResponse {
    validate_endpoint(&req.endpoint)?;
    validate_subscription_key("p256dh", &req.keys.p256dh)?;
    validate_subscription_key("auth", &req.keys.auth)?;

    let user_id = token.as_ref().and_then(|t| t.user_id.as_deref());

    let subscription = state.engine.registry().upsert(
        &req.endpoint,
        &req.keys.p256dh,
        &req.keys.auth,
        user_id,
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(subscription))))
}

/// Idempotent: removing an unknown endpoint still answers 204.
async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UnsubscribeRequest>,
) -> impl IntoResponse {
    if req.endpoint.trim().is_empty() {
        return Err(ApiError::bad_request("Endpoint cannot be empty"));
    }

    let removed = state
        .engine
        .registry()
        .remove(&req.endpoint)
        .map_err(|_| ApiError::internal("Failed to remove subscription"))?;

    tracing::debug!(endpoint = %req.endpoint, removed, "unsubscribe");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
