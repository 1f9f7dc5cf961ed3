//! Tool execution results.

use serde::{Deserialize, Serialize};

/// Text produced by a tool plus a structured completion flag.
///
/// `task_completed` tells the orchestrator the agent's task is finished and
/// its assignment can be released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub content: String,
    #[serde(default)]
    pub task_completed: bool,
}

impl ToolOutcome {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            task_completed: false,
        }
    }

    pub fn completed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            task_completed: true,
        }
    }
}
