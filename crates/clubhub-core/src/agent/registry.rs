//! Explicit registry of the agents a session can be assigned to.
//!
//! Built once at startup by direct `register` calls; lookups are read-only
//! afterwards, so the registry is shared behind an `Arc` without locking.

use std::collections::HashMap;

use tracing::warn;

use clubhub_types::llm::ToolDefinition;

/// Reply used when an agent name has no registered fallback.
pub const DEFAULT_FALLBACK: &str = "Hi! How can I help you today? 🌟";

/// Everything the orchestrator needs to run one agent.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub system_prompt: String,
    /// Functions this agent may call. Empty means plain chat.
    pub tools: Vec<ToolDefinition>,
    /// Canned reply when the backend is unavailable.
    pub fallback: String,
    /// The agent runs the club-creation wizard before consulting the model.
    pub drives_wizard: bool,
}

impl AgentSpec {
    pub fn has_tool(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t.name == tool)
    }
}

/// Name-indexed agent specs plus the default route.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentSpec>,
    default_agent: String,
}

impl AgentRegistry {
    /// Create an empty registry whose default route is `default_agent`.
    pub fn new(default_agent: impl Into<String>) -> Self {
        Self {
            agents: HashMap::new(),
            default_agent: default_agent.into(),
        }
    }

    /// Register an agent. A spec with an existing name replaces the old one.
    pub fn register(&mut self, spec: AgentSpec) {
        if let Some(previous) = self.agents.insert(spec.name.clone(), spec) {
            warn!(agent = %previous.name, "Agent registered twice, replacing previous spec");
        }
    }

    pub fn get(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// The spec for `name`, or the default agent's spec when unknown.
    pub fn resolve(&self, name: &str) -> Option<&AgentSpec> {
        self.agents
            .get(name)
            .or_else(|| self.agents.get(&self.default_agent))
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    /// Canned reply for an agent when the backend cannot answer.
    pub fn fallback_for(&self, name: &str) -> &str {
        self.agents
            .get(name)
            .map(|spec| spec.fallback.as_str())
            .unwrap_or(DEFAULT_FALLBACK)
    }

    /// Registered agent names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
