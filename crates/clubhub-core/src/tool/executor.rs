//! Production tool dispatcher.
//!
//! Checks that the calling agent owns the tool, decodes the arguments into
//! a typed struct and runs the action against the club directory or the
//! built-in knowledge tables. Every successful result is JSON text.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{Instrument, debug, info, info_span};

use clubhub_types::club::{Club, ClubQuery, NewClub};
use clubhub_types::error::ToolError;
use clubhub_types::llm::{ToolArguments, ToolCall};
use clubhub_types::tool::ToolOutcome;

use crate::agent::registry::AgentRegistry;
use crate::club::ClubDirectory;
use crate::wizard::validate::validate_new_club;

use super::ToolDispatcher;
use super::knowledge;

const MAX_SEARCH_RESULTS: u32 = 20;

// ---------------------------------------------------------------------------
// Argument types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchClubsArgs {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CreateClubArgs {
    name: String,
    description: String,
    category: String,
    #[serde(default)]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationArgs {
    #[serde(default)]
    goal: Option<String>,
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct ToolExecutor<D: ClubDirectory> {
    registry: Arc<AgentRegistry>,
    directory: Arc<D>,
}

impl<D: ClubDirectory> ToolExecutor<D> {
    pub fn new(registry: Arc<AgentRegistry>, directory: Arc<D>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    async fn run(&self, call: &ToolCall, user_id: &str) -> Result<ToolOutcome, ToolError> {
        match call.name.as_str() {
            "search_clubs" => {
                let args: SearchClubsArgs = decode(call)?;
                let query = ClubQuery {
                    text: non_empty(args.query),
                    category: non_empty(args.category),
                    city: non_empty(args.city),
                    limit: args.limit.unwrap_or(5).clamp(1, MAX_SEARCH_RESULTS),
                };
                let clubs = self
                    .directory
                    .search_clubs(&query)
                    .await
                    .map_err(|e| execution(call, e))?;
                Ok(ToolOutcome::text(club_list(&clubs).to_string()))
            }
            "create_club" => {
                let args: CreateClubArgs = decode(call)?;
                let club = validate_new_club(&NewClub {
                    name: args.name,
                    description: args.description,
                    category: args.category,
                    city: args.city,
                    owner_id: user_id.to_string(),
                })
                .map_err(|e| ToolError::InvalidArguments {
                    tool: call.name.clone(),
                    reason: e.to_string(),
                })?;
                let created = self
                    .directory
                    .create_club(&club)
                    .await
                    .map_err(|e| execution(call, e))?;
                info!(club_id = %created.id, owner = %user_id, "Club created by tool call");
                let body = json!({
                    "status": "success",
                    "message": format!("Club \"{}\" created successfully", created.name),
                    "club_id": created.id,
                    "club_name": created.name,
                    "link": created.link(),
                });
                Ok(ToolOutcome::completed(body.to_string()))
            }
            "get_my_clubs" => {
                let clubs = self
                    .directory
                    .clubs_owned_by(user_id)
                    .await
                    .map_err(|e| execution(call, e))?;
                Ok(ToolOutcome::text(club_list(&clubs).to_string()))
            }
            "get_platform_status" => Ok(ToolOutcome::text(knowledge::platform_status().to_string())),
            "search_knowledge_base" => {
                let args: KnowledgeArgs = decode(call)?;
                let articles = knowledge::search_articles(&args.query);
                let body = json!({"count": articles.len(), "articles": articles});
                Ok(ToolOutcome::text(body.to_string()))
            }
            "get_development_recommendations" => {
                let args: RecommendationArgs = decode(call)?;
                Ok(ToolOutcome::text(
                    knowledge::recommendations(args.goal.as_deref()).to_string(),
                ))
            }
            other => Err(ToolError::Execution {
                tool: other.to_string(),
                message: "no handler is registered for this tool".to_string(),
            }),
        }
    }
}

impl<D: ClubDirectory> ToolDispatcher for ToolExecutor<D> {
    fn dispatch(
        &self,
        agent: &str,
        call: &ToolCall,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<ToolOutcome, ToolError>> + Send {
        let span = info_span!("tool.execute", tool = %call.name, agent = %agent);
        async move {
            let spec = self
                .registry
                .get(agent)
                .ok_or_else(|| ToolError::UnknownAgent(agent.to_string()))?;
            if !spec.has_tool(&call.name) {
                return Err(ToolError::UnknownTool {
                    agent: agent.to_string(),
                    tool: call.name.clone(),
                });
            }
            debug!("Executing tool call");
            self.run(call, user_id).await
        }
        .instrument(span)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(call: &ToolCall) -> Result<T, ToolError> {
    match &call.arguments {
        ToolArguments::Valid(map) => serde_json::from_value(Value::Object(map.clone())).map_err(
            |e| ToolError::InvalidArguments {
                tool: call.name.clone(),
                reason: e.to_string(),
            },
        ),
        ToolArguments::Malformed { reason, .. } => Err(ToolError::InvalidArguments {
            tool: call.name.clone(),
            reason: reason.clone(),
        }),
    }
}

fn execution(call: &ToolCall, err: impl std::fmt::Display) -> ToolError {
    ToolError::Execution {
        tool: call.name.clone(),
        message: err.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn club_list(clubs: &[Club]) -> Value {
    let items: Vec<Value> = clubs
        .iter()
        .map(|club| {
            json!({
                "id": club.id,
                "name": club.name,
                "category": club.category,
                "city": club.city,
                "description": club.description,
                "link": club.link(),
            })
        })
        .collect();
    json!({"count": items.len(), "clubs": items})
}
