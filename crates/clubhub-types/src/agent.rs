//! Agent assignment types for a conversation session.
//!
//! A session is either unassigned or owned by exactly one named agent
//! that carries its own private working memory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Working state of the agent currently owning a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Registry name of the agent (e.g. `club_specialist`).
    pub name: String,
    /// Agent-private key/value memory. Cleared whenever the agent is released.
    #[serde(default)]
    pub memory: Map<String, Value>,
    /// User turns handled by this agent since it was assigned.
    #[serde(default)]
    pub user_turns: u32,
}

impl AgentState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            memory: Map::new(),
            user_turns: 0,
        }
    }
}

/// Which agent, if any, a session is sticky to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentAssignment {
    #[default]
    NoAgent,
    Assigned(AgentState),
}

impl AgentAssignment {
    /// Assign a fresh agent with empty memory.
    pub fn assign(name: impl Into<String>) -> Self {
        AgentAssignment::Assigned(AgentState::new(name))
    }

    /// Name of the assigned agent, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            AgentAssignment::NoAgent => None,
            AgentAssignment::Assigned(state) => Some(state.name.as_str()),
        }
    }

    pub fn state(&self) -> Option<&AgentState> {
        match self {
            AgentAssignment::NoAgent => None,
            AgentAssignment::Assigned(state) => Some(state),
        }
    }

    pub fn state_mut(&mut self) -> Option<&mut AgentState> {
        match self {
            AgentAssignment::NoAgent => None,
            AgentAssignment::Assigned(state) => Some(state),
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, AgentAssignment::Assigned(_))
    }

    /// Drop the agent together with its memory.
    pub fn release(&mut self) {
        *self = AgentAssignment::NoAgent;
    }
}
