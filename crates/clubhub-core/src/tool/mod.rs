//! Tool execution for model-requested calls.
//!
//! The gateway only sees [`ToolDispatcher`]; [`executor::ToolExecutor`] is the
//! production implementation backed by the club directory and the static
//! platform knowledge in [`knowledge`].

pub mod executor;
pub mod knowledge;

use clubhub_types::error::ToolError;
use clubhub_types::llm::ToolCall;
use clubhub_types::tool::ToolOutcome;

// ---------------------------------------------------------------------------
// Dispatcher trait
// ---------------------------------------------------------------------------

/// Executes one tool call on behalf of an agent.
///
/// Errors are rendered back to the model as `Error: ...` tool messages by
/// the gateway; they never abort the turn.
pub trait ToolDispatcher: Send + Sync {
    fn dispatch(
        &self,
        agent: &str,
        call: &ToolCall,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<ToolOutcome, ToolError>> + Send;
}
