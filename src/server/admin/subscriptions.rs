use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::PaginationParams;
use crate::server::response::{ApiError, DEFAULT_PAGE_SIZE, PaginatedResponse, paginate};

pub async fn list_subscriptions(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let subscriptions = state
        .engine
        .registry()
        .list_page(cursor, DEFAULT_PAGE_SIZE + 1)
        .map_err(|_| ApiError::internal("Failed to list subscriptions"))?;

    let (subscriptions, next_cursor, has_more) = paginate(
        subscriptions,
        DEFAULT_PAGE_SIZE as usize,
        |s| s.endpoint.clone(),
    );

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        subscriptions,
        next_cursor,
        has_more,
    )))
}
