//! Built-in agents: prompts, tool schemas and fallback replies.

use serde_json::json;

use clubhub_types::llm::ToolDefinition;

use super::registry::{AgentRegistry, AgentSpec};

pub const ORCHESTRATOR: &str = "orchestrator";
pub const CLUB_SPECIALIST: &str = "club_specialist";
pub const SUPPORT_SPECIALIST: &str = "support_specialist";
pub const MENTOR_SPECIALIST: &str = "mentor_specialist";

impl AgentRegistry {
    /// The production catalogue, with `orchestrator` as the default route.
    pub fn builtin() -> Self {
        let mut registry = AgentRegistry::new(ORCHESTRATOR);
        registry.register(orchestrator());
        registry.register(club_specialist());
        registry.register(support_specialist());
        registry.register(mentor_specialist());
        registry
    }
}

fn tool(name: &str, description: &str, parameters: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn orchestrator() -> AgentSpec {
    AgentSpec {
        name: ORCHESTRATOR.to_string(),
        system_prompt: "You are the assistant of a community platform where people find and \
            run clubs. Greet users, answer general questions briefly, and point them to what \
            the platform offers: finding or creating clubs, help with the platform itself, and \
            personal development. Answer in the user's language."
            .to_string(),
        tools: vec![],
        fallback: "Hi! 👋 I'm the platform assistant.\n\nI can help you:\n\
            🔍 find clubs and communities\n📚 learn how the platform works\n\
            🎯 grow your skills\n\nWhat would you like to do?"
            .to_string(),
        drives_wizard: false,
    }
}

fn club_specialist() -> AgentSpec {
    AgentSpec {
        name: CLUB_SPECIALIST.to_string(),
        system_prompt: "You are the club specialist of a community platform. Help users find \
            clubs with search_clubs, list the clubs they own with get_my_clubs, and create clubs \
            with create_club once name, description (at least 200 characters), category and \
            city are known. Never invent clubs: only mention clubs returned by tools. Answer in \
            the user's language."
            .to_string(),
        tools: vec![
            tool(
                "search_clubs",
                "Search clubs by keywords, category or city",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "Search text, e.g. 'chess'"},
                        "category": {"type": "string", "description": "Club category"},
                        "city": {"type": "string", "description": "City to filter by"},
                        "limit": {"type": "integer", "description": "Maximum results", "default": 5}
                    },
                    "required": []
                }),
            ),
            tool(
                "create_club",
                "Create a new club owned by the current user",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Unique club name, 3-200 characters"},
                        "description": {"type": "string", "description": "At least 200 characters"},
                        "category": {"type": "string", "description": "Club category"},
                        "city": {"type": "string", "description": "City, omit for online clubs"}
                    },
                    "required": ["name", "description", "category"]
                }),
            ),
            tool(
                "get_my_clubs",
                "List clubs created by the current user",
                json!({"type": "object", "properties": {}, "required": []}),
            ),
        ],
        fallback: "I can help you find clubs and communities! Try asking:\n\
            - 'Are there any football clubs?'\n- 'Show me sports communities'\n\
            - 'I want to create a club'"
            .to_string(),
        drives_wizard: true,
    }
}

fn support_specialist() -> AgentSpec {
    AgentSpec {
        name: SUPPORT_SPECIALIST.to_string(),
        system_prompt: "You are the support specialist of a community platform. Diagnose \
            problems step by step, check get_platform_status for outages and use \
            search_knowledge_base before answering how-to questions. Answer in the user's \
            language."
            .to_string(),
        tools: vec![
            tool(
                "get_platform_status",
                "Current operational status of platform services",
                json!({"type": "object", "properties": {}, "required": []}),
            ),
            tool(
                "search_knowledge_base",
                "Search help articles",
                json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": "What the user needs help with"}
                    },
                    "required": ["query"]
                }),
            ),
        ],
        fallback: "I'll help you with the platform! I can:\n- help with sign-up and login\n\
            - explain how to create a club\n- answer questions about platform features"
            .to_string(),
        drives_wizard: false,
    }
}

fn mentor_specialist() -> AgentSpec {
    AgentSpec {
        name: MENTOR_SPECIALIST.to_string(),
        system_prompt: "You are the personal development mentor of a community platform. Ask \
            about the user's goals, suggest concrete next steps and use \
            get_development_recommendations for structured advice. Answer in the user's language."
            .to_string(),
        tools: vec![tool(
            "get_development_recommendations",
            "Development recommendations for a goal",
            json!({
                "type": "object",
                "properties": {
                    "goal": {"type": "string", "description": "What the user wants to achieve"}
                },
                "required": []
            }),
        )],
        fallback: "I can help with your growth! Ask me:\n- 'What should I learn next?'\n\
            - 'I want to learn programming'\n- 'How do I become a better speaker?'"
            .to_string(),
        drives_wizard: false,
    }
}
