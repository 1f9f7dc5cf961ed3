//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/sessions               - Start a new session
//! - GET    /api/v1/sessions/{id}/messages - Ordered message history
//! - GET    /api/v1/sessions/{id}/wizard   - Club wizard progress
//! - DELETE /api/v1/sessions/{id}          - Delete a session and its history

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use clubhub_types::chat::{ChatMessage, ConversationSession};

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /sessions.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
}

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default = "default_message_limit")]
    pub limit: u32,
}

fn default_message_limit() -> u32 {
    100
}

/// Session must exist before anything hanging off it is read.
async fn require_session(state: &AppState, id: &Uuid) -> Result<ConversationSession, AppError> {
    state
        .orchestrator
        .store()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session '{id}' not found")))
}

/// POST /api/v1/sessions - Start a new, unassigned session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConversationSession>>), AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }

    let session = state.orchestrator.store().create(&body.user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let self_link = format!("/api/v1/sessions/{}/messages", session.id);
    let resp = ApiResponse::success(session, request_id, elapsed).with_link("messages", &self_link);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/sessions/{id}/messages - Latest `limit` messages, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    require_session(&state, &sid).await?;

    let messages = state.orchestrator.store().history(&sid, query.limit).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &format!("/api/v1/sessions/{sid}/messages"));

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id}/wizard - Wizard state with its progress percentage.
pub async fn get_wizard(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    require_session(&state, &sid).await?;

    let wizard = state
        .orchestrator
        .store()
        .wizard(&sid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No wizard for session '{sid}'")))?;

    let mut value =
        serde_json::to_value(&wizard).map_err(|e| AppError::Internal(e.to_string()))?;
    value["progress"] = serde_json::json!(wizard.progress());

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(value, request_id, elapsed)))
}

/// DELETE /api/v1/sessions/{id} - Delete a session with its messages and wizard state.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let sid = parse_uuid(&session_id)?;

    if state.orchestrator.delete_session(&sid).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session '{sid}' not found")))
    }
}
