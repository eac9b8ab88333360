//! Notification inbox endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use credimo_core::models::notification::Notification;
use credimo_core::repository::NotificationRepository;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::Auth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Query(query): Query<InboxQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let items = state
        .notifications
        .list(
            principal.user_id,
            query.unread_only,
            principal.role.sees_new_case_feed(),
        )
        .await?;
    Ok(Json(items))
}

/// Idempotent; marking someone else's notification is a no-op.
pub async fn mark_read(
    State(state): State<AppState>,
    Auth(principal): Auth,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state.notifications.mark_read(id, principal.user_id).await?;
    Ok(Json(json!({"status": "ok"})))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> ApiResult<Json<Value>> {
    let marked = state.notifications.mark_all_read(principal.user_id).await?;
    Ok(Json(json!({"marked": marked})))
}
