//! SessionRepository trait definition.
//!
//! Persistence for conversation sessions, their append-only message log and
//! the per-session wizard state. Same RPITIT pattern as the other ports.

use clubhub_types::chat::{ChatMessage, ConversationSession, MessageRole};
use clubhub_types::error::RepositoryError;
use clubhub_types::wizard::WizardState;
use uuid::Uuid;

/// Repository trait for sessions, messages and wizard state.
///
/// Implementations live in clubhub-infra (e.g., `SqliteSessionRepository`).
pub trait SessionRepository: Send + Sync {
    /// Create a new session.
    fn create_session(
        &self,
        session: &ConversationSession,
    ) -> impl std::future::Future<Output = Result<ConversationSession, RepositoryError>> + Send;

    /// Get a session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ConversationSession>, RepositoryError>> + Send;

    /// Persist the agent assignment and flags of an existing session.
    fn update_session(
        &self,
        session: &ConversationSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session together with its messages and wizard state.
    /// Returns `false` when the session did not exist.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Append a message. The repository assigns the id and a `created_at`
    /// strictly later than every earlier message of the session.
    fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
        token_cost: u32,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// The latest `limit` messages of a session, oldest first.
    fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Get the wizard state of a session, if one was created.
    fn get_wizard(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<WizardState>, RepositoryError>> + Send;

    /// Insert or replace the wizard state of a session.
    fn save_wizard(
        &self,
        state: &WizardState,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove the wizard state of a session.
    fn delete_wizard(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
