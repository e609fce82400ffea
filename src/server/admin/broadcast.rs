use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAdmin;
use crate::push::BroadcastMessage;
use crate::server::AppState;
use crate::server::dto::BroadcastRequest;
use crate::server::response::{ApiError, ApiResponse};

pub async fn broadcast(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<BroadcastRequest>,
) -> impl IntoResponse {
    let message = BroadcastMessage::from(req);

    tracing::info!(token = %admin.0.id, title = %message.title, "broadcast requested");

    let report = state.engine.broadcast(Some(&admin.0), &message).await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(report)))
}
