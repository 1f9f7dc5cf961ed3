//! Conversation session and message log types.
//!
//! A session is one conversation between a user and the agent system.
//! Messages form an append-only log ordered by `created_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentAssignment;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// One persisted conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    /// Opaque id of the acting user, supplied by the caller.
    pub user_id: String,
    pub agent: AgentAssignment,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// A fresh, active session with no agent assigned.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            agent: AgentAssignment::NoAgent,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single turn in the message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    /// Tokens billed for producing this message (0 for user and canned turns).
    pub token_cost: u32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unassigned_and_active() {
        let session = ConversationSession::new("user-42");
        assert!(session.active);
        assert_eq!(session.user_id, "user-42");
        assert!(!session.agent.is_assigned());
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_message_role_reexport() {
        let role = MessageRole::Tool;
        assert_eq!(role.to_string(), "tool");
    }

    #[test]
    fn test_chat_message_serialize() {
        let message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: "Hello!".to_string(),
            token_cost: 12,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        assert!(json.contains("\"token_cost\":12"));
    }
}
