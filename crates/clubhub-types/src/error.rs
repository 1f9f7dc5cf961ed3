use thiserror::Error;

/// Errors from repository operations (used by trait definitions in clubhub-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors raised by the club directory when creating or reading clubs.
#[derive(Debug, Error)]
pub enum ClubError {
    #[error("invalid club data: {0}")]
    Validation(String),

    #[error("a club named '{0}' already exists")]
    DuplicateName(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ClubError {
    fn from(err: RepositoryError) -> Self {
        ClubError::Storage(err.to_string())
    }
}

/// Errors from dispatching a model-requested tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("unknown tool '{tool}' for agent '{agent}'")]
    UnknownTool { agent: String, tool: String },

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}
