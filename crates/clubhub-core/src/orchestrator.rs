//! The conversation loop behind `handle_message`.
//!
//! One call resolves (or creates) the session, serializes on its lock,
//! records the user message, picks the agent, lets the wizard or the model
//! answer, records the reply and returns it. Every failure is logged and
//! answered with canned text; nothing escapes as an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use clubhub_types::agent::AgentAssignment;
use clubhub_types::chat::{ChatMessage, ConversationSession, MessageRole};
use clubhub_types::config::{AppConfig, OrchestratorConfig};
use clubhub_types::error::RepositoryError;
use clubhub_types::llm::Message;
use clubhub_types::wizard::WizardState;

use crate::agent::registry::AgentRegistry;
use crate::agent::router::AgentRouter;
use crate::club::ClubDirectory;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::gateway::{GatewaySettings, LlmGateway, TurnRequest};
use crate::session::locks::SessionLocks;
use crate::session::repository::SessionRepository;
use crate::session::store::SessionStore;
use crate::tool::executor::ToolExecutor;
use crate::wizard::{self, WizardTurn};

/// Result of one `handle_message` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response_text: String,
    pub session_id: Uuid,
    /// Id of the stored assistant message.
    pub message_id: Uuid,
    pub tokens_used: u32,
    /// Agent that produced the reply, if routing got that far.
    pub assigned_agent: Option<String>,
}

/// What an agent produced for one turn, before it is stored.
struct TurnOutput {
    text: String,
    tokens_used: u32,
}

pub struct Orchestrator<R: SessionRepository, D: ClubDirectory> {
    store: SessionStore<R>,
    registry: Arc<AgentRegistry>,
    router: AgentRouter,
    gateway: LlmGateway,
    tools: ToolExecutor<D>,
    directory: Arc<D>,
    locks: SessionLocks,
    config: OrchestratorConfig,
}

impl<R: SessionRepository, D: ClubDirectory> Orchestrator<R, D> {
    /// Wire the orchestrator with the built-in agent catalogue.
    pub fn new(repo: R, directory: Arc<D>, provider: Arc<BoxLlmProvider>, config: &AppConfig) -> Self {
        Self::with_registry(
            repo,
            directory,
            provider,
            Arc::new(AgentRegistry::builtin()),
            config,
        )
    }

    pub fn with_registry(
        repo: R,
        directory: Arc<D>,
        provider: Arc<BoxLlmProvider>,
        registry: Arc<AgentRegistry>,
        config: &AppConfig,
    ) -> Self {
        let router = AgentRouter::new(
            registry.default_agent(),
            config.orchestrator.reset_after_user_turns,
        );
        let gateway = LlmGateway::new(
            provider,
            GatewaySettings::from_config(&config.llm, &config.orchestrator),
        );
        Self {
            store: SessionStore::new(repo),
            tools: ToolExecutor::new(registry.clone(), directory.clone()),
            registry,
            router,
            gateway,
            directory,
            locks: SessionLocks::new(),
            config: config.orchestrator.clone(),
        }
    }

    pub fn store(&self) -> &SessionStore<R> {
        &self.store
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Delete a session once no turn is running on it.
    pub async fn delete_session(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        let _guard = self.locks.acquire(*session_id).await;
        self.store.delete(session_id).await
    }

    /// Answer one user message.
    ///
    /// An unknown or missing `session_id` starts a new session; the id in the
    /// reply tells the caller which one was used.
    pub async fn handle_message(
        &self,
        session_id: Option<Uuid>,
        message: &str,
        user_id: &str,
    ) -> ChatReply {
        let span = info_span!(
            "chat.turn",
            user_id = %user_id,
            session_id = tracing::field::Empty,
            agent = tracing::field::Empty,
        );
        self.handle_message_inner(session_id, message, user_id)
            .instrument(span)
            .await
    }

    async fn handle_message_inner(
        &self,
        session_id: Option<Uuid>,
        message: &str,
        user_id: &str,
    ) -> ChatReply {
        let default_agent = self.registry.default_agent().to_string();

        let (session, created) = match self.store.get_or_create(session_id, user_id).await {
            Ok(found) => found,
            Err(err) => {
                error!(error = %err, "Session lookup failed");
                return self.transient_reply(session_id.unwrap_or_else(Uuid::now_v7), &default_agent);
            }
        };
        tracing::Span::current().record("session_id", tracing::field::display(session.id));

        let _guard = self.locks.acquire(session.id).await;

        // Another turn may have changed the session while we waited.
        let mut session = if created {
            session
        } else {
            match self.store.get(&session.id).await {
                Ok(Some(fresh)) => fresh,
                Ok(None) => session,
                Err(err) => {
                    error!(error = %err, "Session reload failed");
                    return self.transient_reply(session.id, &default_agent);
                }
            }
        };

        let message = message.trim();
        if message.is_empty() {
            warn!("Empty message ignored");
            let agent = session.agent.name().unwrap_or(default_agent.as_str()).to_string();
            return self.transient_reply(session.id, &agent);
        }

        // The user's input is stored before any model call so it survives a
        // failed or abandoned turn.
        if let Err(err) = self
            .store
            .append(&session.id, MessageRole::User, message, 0)
            .await
        {
            error!(error = %err, "Failed to store user message");
            return self.transient_reply(session.id, &default_agent);
        }

        let (agent, output) = match self.respond(&mut session, message, user_id).await {
            Ok((agent, output)) => (agent, output),
            Err(err) => {
                error!(error = %err, "Turn failed, answering with fallback");
                let agent = session.agent.name().unwrap_or(default_agent.as_str()).to_string();
                let output = TurnOutput {
                    text: self.registry.fallback_for(&agent).to_string(),
                    tokens_used: 0,
                };
                (agent, output)
            }
        };
        tracing::Span::current().record("agent", tracing::field::display(&agent));

        if let Err(err) = self.store.save(&mut session).await {
            error!(error = %err, "Failed to save session");
        }

        let message_id = match self
            .store
            .append(
                &session.id,
                MessageRole::Assistant,
                &output.text,
                output.tokens_used,
            )
            .await
        {
            Ok(stored) => stored.id,
            Err(err) => {
                error!(error = %err, "Failed to store assistant message");
                Uuid::now_v7()
            }
        };

        info!(tokens = output.tokens_used, "Turn completed");
        ChatReply {
            response_text: output.text,
            session_id: session.id,
            message_id,
            tokens_used: output.tokens_used,
            assigned_agent: Some(agent),
        }
    }

    /// Pick the agent and let it answer. Mutates the session's assignment;
    /// the caller persists it.
    async fn respond(
        &self,
        session: &mut ConversationSession,
        message: &str,
        user_id: &str,
    ) -> Result<(String, TurnOutput), RepositoryError> {
        let mut wizard_state = self.store.wizard(&session.id).await?;
        let agent_name = self.assign_agent(session, message, &mut wizard_state).await?;

        let spec = match self.registry.resolve(&agent_name) {
            Some(spec) => spec,
            None => {
                warn!(agent = %agent_name, "No agent registered, answering with fallback");
                return Ok((
                    agent_name.clone(),
                    TurnOutput {
                        text: self.registry.fallback_for(&agent_name).to_string(),
                        tokens_used: 0,
                    },
                ));
            }
        };

        if let Some(state) = session.agent.state_mut() {
            state.user_turns += 1;
        }

        if spec.drives_wizard {
            let mut state = wizard_state.unwrap_or_else(|| WizardState::new(session.id));
            let turn =
                wizard::handle_turn(&mut state, message, self.directory.as_ref(), user_id).await;
            if state.stage.is_terminal() {
                // Any commit already happened; a storage error must not hide its reply.
                self.finish_wizard(&state).await;
            } else {
                self.store.save_wizard(&state).await?;
            }

            if let WizardTurn::Handled(reply) = turn {
                debug!(stage = %state.stage, "Wizard answered");
                if reply.task_completed {
                    info!(agent = %agent_name, "Task completed, releasing agent");
                    session.agent.release();
                }
                return Ok((
                    agent_name,
                    TurnOutput {
                        text: reply.text,
                        tokens_used: 0,
                    },
                ));
            }
        }

        let history = self.model_history(&session.id).await?;
        let reply = self
            .gateway
            .run_turn(
                TurnRequest {
                    agent: spec,
                    history: &history,
                    message,
                    user_id,
                },
                &self.tools,
            )
            .await;

        if reply.task_completed {
            info!(agent = %agent_name, "Task completed, releasing agent");
            session.agent.release();
        }
        Ok((
            agent_name,
            TurnOutput {
                text: reply.text,
                tokens_used: reply.tokens_used,
            },
        ))
    }

    /// Keep the sticky agent unless a reset fires; otherwise route.
    async fn assign_agent(
        &self,
        session: &mut ConversationSession,
        message: &str,
        wizard_state: &mut Option<WizardState>,
    ) -> Result<String, RepositoryError> {
        let stage = wizard_state.as_ref().map(|w| w.stage);
        let sticky = session
            .agent
            .state()
            .map(|state| (state.name.clone(), self.router.reset_reason(message, state, stage)));

        let mut reset = false;
        match sticky {
            Some((current, None)) => {
                debug!(agent = %current, "Sticky agent continues");
                return Ok(current);
            }
            Some((current, Some(reason))) => {
                info!(agent = %current, reason = ?reason, "Resetting agent");
                if let Some(mut state) = wizard_state.take() {
                    let from = state.stage;
                    if wizard::cancel(&mut state) {
                        info!(from = %from, "Wizard cancelled");
                    }
                    self.finish_wizard(&state).await;
                }
                session.agent.release();
                reset = true;
            }
            None => {}
        }

        // After a reset the message is routed on its own.
        let history = if reset {
            Vec::new()
        } else {
            self.routing_history(&session.id).await?
        };
        let agent = self.router.route(message, &history);
        info!(agent = %agent, "Agent assigned");
        session.agent = AgentAssignment::assign(agent.clone());
        Ok(agent)
    }

    /// Forget a wizard that reached a terminal stage. When the row cannot be
    /// deleted the terminal stage is written over it instead, so a stale
    /// `confirm` can never commit a second time.
    async fn finish_wizard(&self, state: &WizardState) {
        let Err(err) = self.store.clear_wizard(&state.session_id).await else {
            return;
        };
        warn!(error = %err, stage = %state.stage, "Failed to delete finished wizard");
        if let Err(err) = self.store.save_wizard(state).await {
            error!(error = %err, stage = %state.stage, "Failed to record finished wizard");
        }
    }

    /// Messages before the current one, for routing.
    async fn routing_history(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut history = self
            .store
            .history(session_id, self.config.routing_history_limit + 1)
            .await?;
        history.pop();
        Ok(history)
    }

    /// User and assistant turns before the current message, as model input.
    async fn model_history(&self, session_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        let mut stored = self
            .store
            .history(session_id, self.config.max_history_messages + 1)
            .await?;
        stored.pop();
        Ok(stored
            .into_iter()
            .filter_map(|m| match m.role {
                MessageRole::User => Some(Message::user(m.content)),
                MessageRole::Assistant => Some(Message::assistant(m.content)),
                _ => None,
            })
            .collect())
    }

    /// Reply that could not be stored: canned text under a fresh id.
    fn transient_reply(&self, session_id: Uuid, agent: &str) -> ChatReply {
        ChatReply {
            response_text: self.registry.fallback_for(agent).to_string(),
            session_id,
            message_id: Uuid::now_v7(),
            tokens_used: 0,
            assigned_agent: None,
        }
    }
}
