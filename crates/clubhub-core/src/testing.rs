//! In-memory port implementations shared by the core test suites.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use clubhub_types::chat::{ChatMessage, ConversationSession, MessageRole};
use clubhub_types::club::{Club, ClubQuery, NewClub};
use clubhub_types::error::{ClubError, RepositoryError};
use clubhub_types::wizard::WizardState;

use crate::club::ClubDirectory;
use crate::session::repository::SessionRepository;

#[derive(Default)]
pub(crate) struct InMemorySessionRepository {
    sessions: Mutex<HashMap<Uuid, ConversationSession>>,
    messages: Mutex<HashMap<Uuid, Vec<ChatMessage>>>,
    wizards: Mutex<HashMap<Uuid, WizardState>>,
    wizard_writes_fail: Arc<AtomicBool>,
}

impl InMemorySessionRepository {
    /// While the returned flag is set, wizard saves and deletes fail.
    pub fn wizard_write_switch(&self) -> Arc<AtomicBool> {
        self.wizard_writes_fail.clone()
    }

    fn wizard_write_result(&self) -> Result<(), RepositoryError> {
        if self.wizard_writes_fail.load(Ordering::SeqCst) {
            Err(RepositoryError::Query("database is locked".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn all_messages(&self, session_id: &Uuid) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn create_session(
        &self,
        session: &ConversationSession,
    ) -> impl Future<Output = Result<ConversationSession, RepositoryError>> + Send {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        let session = session.clone();
        async move { Ok(session) }
    }

    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl Future<Output = Result<Option<ConversationSession>, RepositoryError>> + Send {
        let found = self.sessions.lock().unwrap().get(session_id).cloned();
        async move { Ok(found) }
    }

    fn update_session(
        &self,
        session: &ConversationSession,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut sessions = self.sessions.lock().unwrap();
        let result = match sessions.get_mut(&session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        };
        async move { result }
    }

    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        let existed = self.sessions.lock().unwrap().remove(session_id).is_some();
        self.messages.lock().unwrap().remove(session_id);
        self.wizards.lock().unwrap().remove(session_id);
        async move { Ok(existed) }
    }

    fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
        token_cost: u32,
    ) -> impl Future<Output = Result<ChatMessage, RepositoryError>> + Send {
        let result = if self.sessions.lock().unwrap().contains_key(session_id) {
            let mut messages = self.messages.lock().unwrap();
            let log = messages.entry(*session_id).or_default();
            let mut created_at = Utc::now();
            if let Some(last) = log.last() {
                if created_at <= last.created_at {
                    created_at = last.created_at + Duration::microseconds(1);
                }
            }
            let message = ChatMessage {
                id: Uuid::now_v7(),
                session_id: *session_id,
                role,
                content: content.to_string(),
                token_cost,
                created_at,
            };
            log.push(message.clone());
            Ok(message)
        } else {
            Err(RepositoryError::NotFound)
        };
        async move { result }
    }

    fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send {
        let all = self.all_messages(session_id);
        let skip = all.len().saturating_sub(limit as usize);
        let recent: Vec<ChatMessage> = all.into_iter().skip(skip).collect();
        async move { Ok(recent) }
    }

    fn get_wizard(
        &self,
        session_id: &Uuid,
    ) -> impl Future<Output = Result<Option<WizardState>, RepositoryError>> + Send {
        let found = self.wizards.lock().unwrap().get(session_id).cloned();
        async move { Ok(found) }
    }

    fn save_wizard(
        &self,
        state: &WizardState,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = self.wizard_write_result();
        if result.is_ok() {
            self.wizards
                .lock()
                .unwrap()
                .insert(state.session_id, state.clone());
        }
        async move { result }
    }

    fn delete_wizard(
        &self,
        session_id: &Uuid,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = self.wizard_write_result();
        if result.is_ok() {
            self.wizards.lock().unwrap().remove(session_id);
        }
        async move { result }
    }
}

/// Club directory that counts create attempts and can fail on demand.
#[derive(Default)]
pub(crate) struct InMemoryClubDirectory {
    clubs: Mutex<Vec<Club>>,
    create_calls: AtomicUsize,
    next_error: Mutex<Option<ClubError>>,
}

impl InMemoryClubDirectory {
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, error: ClubError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    pub fn clubs(&self) -> Vec<Club> {
        self.clubs.lock().unwrap().clone()
    }
}

impl ClubDirectory for InMemoryClubDirectory {
    fn create_club(&self, club: &NewClub) -> impl Future<Output = Result<Club, ClubError>> + Send {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let result = if let Some(err) = self.next_error.lock().unwrap().take() {
            Err(err)
        } else {
            let mut clubs = self.clubs.lock().unwrap();
            if clubs
                .iter()
                .any(|c| c.name.to_lowercase() == club.name.to_lowercase())
            {
                Err(ClubError::DuplicateName(club.name.clone()))
            } else {
                let created = Club {
                    id: Uuid::now_v7(),
                    name: club.name.clone(),
                    description: club.description.clone(),
                    category: club.category.clone(),
                    city: club.city.clone(),
                    owner_id: club.owner_id.clone(),
                    created_at: Utc::now(),
                };
                clubs.push(created.clone());
                Ok(created)
            }
        };
        async move { result }
    }

    fn search_clubs(
        &self,
        query: &ClubQuery,
    ) -> impl Future<Output = Result<Vec<Club>, ClubError>> + Send {
        let text = query.text.as_deref().map(str::to_lowercase);
        let found: Vec<Club> = self
            .clubs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                text.as_deref().is_none_or(|t| {
                    c.name.to_lowercase().contains(t) || c.description.to_lowercase().contains(t)
                })
            })
            .filter(|c| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|cat| c.category.eq_ignore_ascii_case(cat))
            })
            .filter(|c| {
                query
                    .city
                    .as_deref()
                    .is_none_or(|city| c.city.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(city)))
            })
            .take(query.limit as usize)
            .cloned()
            .collect();
        async move { Ok(found) }
    }

    fn clubs_owned_by(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<Club>, ClubError>> + Send {
        let owned: Vec<Club> = self
            .clubs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        async move { Ok(owned) }
    }
}
