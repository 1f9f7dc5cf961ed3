//! Chat HTTP handler.
//!
//! Endpoint:
//! - POST /api/v1/chat - Handle one user message and return the agent's reply

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use clubhub_core::orchestrator::ChatReply;

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omit (or send an unknown id) to start a new session.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    pub user_id: String,
}

/// POST /api/v1/chat - Answer one message.
///
/// Request-shape problems are rejected with 400; everything after that is
/// answered by the orchestrator, which never fails.
pub async fn post_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    let session_id = body
        .session_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_uuid)
        .transpose()?;

    let reply = state
        .orchestrator
        .handle_message(session_id, &body.message, &body.user_id)
        .await;

    let elapsed = start.elapsed().as_millis() as u64;
    let self_link = format!("/api/v1/sessions/{}/messages", reply.session_id);
    let resp = ApiResponse::success(reply, request_id, elapsed).with_link("messages", &self_link);

    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::http::handlers::test_client::send;
    use crate::http::router::build_router;
    use crate::state::testing::test_state;

    #[tokio::test]
    async fn chat_creates_session_and_replies() {
        let router = build_router(test_state().await);

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/chat",
            Some(json!({"message": "hello there", "user_id": "u1"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["response_text"], "Happy to help with that.");
        assert_eq!(data["tokens_used"], 18);
        assert_eq!(data["assigned_agent"], "orchestrator");
        assert!(data["session_id"].as_str().is_some());
        assert!(body["meta"]["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn chat_continues_existing_session() {
        let router = build_router(test_state().await);

        let (_, first) = send(
            &router,
            "POST",
            "/api/v1/chat",
            Some(json!({"message": "hello", "user_id": "u1"})),
        )
        .await;
        let session_id = first["data"]["session_id"].as_str().unwrap().to_string();

        let (_, second) = send(
            &router,
            "POST",
            "/api/v1/chat",
            Some(json!({"session_id": session_id, "message": "and again", "user_id": "u1"})),
        )
        .await;
        assert_eq!(second["data"]["session_id"], session_id.as_str());

        let (_, history) = send(
            &router,
            "GET",
            &format!("/api/v1/sessions/{session_id}/messages"),
            None,
        )
        .await;
        assert_eq!(history["data"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn chat_rejects_bad_input() {
        let router = build_router(test_state().await);

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/chat",
            Some(json!({"message": "   ", "user_id": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &router,
            "POST",
            "/api/v1/chat",
            Some(json!({"session_id": "not-a-uuid", "message": "hi", "user_id": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
