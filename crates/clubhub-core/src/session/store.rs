//! Session store: lookup-or-create, message log access, wizard state.
//!
//! Pure storage semantics. Agent and wizard decisions live in the
//! orchestrator; this layer only records them.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use clubhub_types::chat::{ChatMessage, ConversationSession, MessageRole};
use clubhub_types::error::RepositoryError;
use clubhub_types::wizard::WizardState;

use super::repository::SessionRepository;

/// Generic over `SessionRepository` so clubhub-core never depends on
/// clubhub-infra.
pub struct SessionStore<R: SessionRepository> {
    repo: R,
}

impl<R: SessionRepository> SessionStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    // --- Sessions ---

    /// Start a new, unassigned session for `user_id`.
    pub async fn create(&self, user_id: &str) -> Result<ConversationSession, RepositoryError> {
        let session = self.repo.create_session(&ConversationSession::new(user_id)).await?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    /// Resolve the session a message belongs to.
    ///
    /// An unknown or inactive id is not an error: a fresh session is created
    /// instead. The flag is `true` when a new session was created.
    pub async fn get_or_create(
        &self,
        session_id: Option<Uuid>,
        user_id: &str,
    ) -> Result<(ConversationSession, bool), RepositoryError> {
        if let Some(id) = session_id {
            match self.repo.get_session(&id).await? {
                Some(session) if session.active => {
                    debug!(session_id = %id, "Session resumed");
                    return Ok((session, false));
                }
                Some(_) => warn!(session_id = %id, "Session inactive, starting a new one"),
                None => warn!(session_id = %id, "Session not found, starting a new one"),
            }
        }
        Ok((self.create(user_id).await?, true))
    }

    pub async fn get(&self, session_id: &Uuid) -> Result<Option<ConversationSession>, RepositoryError> {
        self.repo.get_session(session_id).await
    }

    /// Persist session changes, bumping `updated_at`.
    pub async fn save(&self, session: &mut ConversationSession) -> Result<(), RepositoryError> {
        session.updated_at = Utc::now();
        self.repo.update_session(session).await
    }

    /// Delete a session with its messages and wizard state.
    pub async fn delete(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        let deleted = self.repo.delete_session(session_id).await?;
        if deleted {
            info!(session_id = %session_id, "Session deleted");
        }
        Ok(deleted)
    }

    // --- Message log ---

    pub async fn append(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
        token_cost: u32,
    ) -> Result<ChatMessage, RepositoryError> {
        self.repo
            .append_message(session_id, role, content, token_cost)
            .await
    }

    /// The latest `limit` messages, oldest first.
    pub async fn history(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.repo.recent_messages(session_id, limit).await
    }

    // --- Wizard state ---

    pub async fn wizard(&self, session_id: &Uuid) -> Result<Option<WizardState>, RepositoryError> {
        self.repo.get_wizard(session_id).await
    }

    pub async fn save_wizard(&self, state: &WizardState) -> Result<(), RepositoryError> {
        self.repo.save_wizard(state).await
    }

    pub async fn clear_wizard(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        self.repo.delete_wizard(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemorySessionRepository;
    use clubhub_types::agent::AgentAssignment;

    fn store() -> SessionStore<InMemorySessionRepository> {
        SessionStore::new(InMemorySessionRepository::default())
    }

    #[tokio::test]
    async fn test_get_or_create_without_id_creates() {
        let store = store();
        let (session, created) = store.get_or_create(None, "user-1").await.unwrap();
        assert!(created);
        assert_eq!(session.user_id, "user-1");
        assert!(store.get(&session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_or_create_resumes_existing() {
        let store = store();
        let first = store.create("user-1").await.unwrap();
        let (session, created) = store.get_or_create(Some(first.id), "user-1").await.unwrap();
        assert!(!created);
        assert_eq!(session.id, first.id);
    }

    #[tokio::test]
    async fn test_unknown_id_creates_fresh_session() {
        let store = store();
        let missing = Uuid::now_v7();
        let (session, created) = store.get_or_create(Some(missing), "user-1").await.unwrap();
        assert!(created);
        assert_ne!(session.id, missing);
    }

    #[tokio::test]
    async fn test_inactive_session_is_replaced() {
        let store = store();
        let mut old = store.create("user-1").await.unwrap();
        old.active = false;
        store.save(&mut old).await.unwrap();

        let (session, created) = store.get_or_create(Some(old.id), "user-1").await.unwrap();
        assert!(created);
        assert_ne!(session.id, old.id);
    }

    #[tokio::test]
    async fn test_save_persists_assignment() {
        let store = store();
        let mut session = store.create("user-1").await.unwrap();
        session.agent = AgentAssignment::assign("club_specialist");
        store.save(&mut session).await.unwrap();

        let loaded = store.get(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.agent.name(), Some("club_specialist"));
        assert!(loaded.updated_at >= loaded.created_at);
    }

    #[tokio::test]
    async fn test_history_is_ordered_and_limited() {
        let store = store();
        let session = store.create("user-1").await.unwrap();
        for i in 0..5 {
            store
                .append(&session.id, MessageRole::User, &format!("m{i}"), 0)
                .await
                .unwrap();
        }

        let history = store.history(&session.id, 3).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
        assert!(history.windows(2).all(|w| w[0].created_at < w[1].created_at));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = store();
        let session = store.create("user-1").await.unwrap();
        store
            .append(&session.id, MessageRole::User, "hello", 0)
            .await
            .unwrap();
        store.save_wizard(&WizardState::new(session.id)).await.unwrap();

        assert!(store.delete(&session.id).await.unwrap());
        assert!(store.get(&session.id).await.unwrap().is_none());
        assert!(store.history(&session.id, 10).await.unwrap().is_empty());
        assert!(store.wizard(&session.id).await.unwrap().is_none());
        assert!(!store.delete(&session.id).await.unwrap());
    }
}
