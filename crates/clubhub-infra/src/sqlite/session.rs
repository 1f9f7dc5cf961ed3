//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `clubhub-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reader for SELECT and
//! writer for everything else.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use clubhub_core::session::repository::SessionRepository;
use clubhub_types::agent::AgentAssignment;
use clubhub_types::chat::{ChatMessage, ConversationSession, MessageRole};
use clubhub_types::error::RepositoryError;
use clubhub_types::wizard::{ClubDraft, WizardStage, WizardState};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    user_id: String,
    agent: String,
    active: i64,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            agent: row.try_get("agent")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ConversationSession, RepositoryError> {
        let id = parse_uuid(&self.id, "session id")?;
        let agent: AgentAssignment = serde_json::from_str(&self.agent)
            .map_err(|e| RepositoryError::Query(format!("invalid agent assignment: {e}")))?;

        Ok(ConversationSession {
            id,
            user_id: self.user_id,
            agent,
            active: self.active != 0,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    token_cost: i64,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            token_cost: row.try_get("token_cost")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            session_id: parse_uuid(&self.session_id, "session_id")?,
            role,
            content: self.content,
            token_cost: self.token_cost as u32,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct WizardRow {
    session_id: String,
    stage: String,
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    city: Option<String>,
    last_error: Option<String>,
    correcting: i64,
    updated_at: String,
}

impl WizardRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            stage: row.try_get("stage")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            city: row.try_get("city")?,
            last_error: row.try_get("last_error")?,
            correcting: row.try_get("correcting")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_state(self) -> Result<WizardState, RepositoryError> {
        let stage: WizardStage = self
            .stage
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(WizardState {
            session_id: parse_uuid(&self.session_id, "session_id")?,
            stage,
            fields: ClubDraft {
                name: self.name,
                description: self.description,
                category: self.category,
                city: self.city,
            },
            last_error: self.last_error,
            correcting: self.correcting != 0,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so text order matches time order.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(
        &self,
        session: &ConversationSession,
    ) -> Result<ConversationSession, RepositoryError> {
        let agent = serde_json::to_string(&session.agent)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO sessions (id, user_id, agent, active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.user_id)
        .bind(agent)
        .bind(session.active as i64)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("session {} already exists", session.id))
            }
            other => query_err(other),
        })?;

        Ok(session.clone())
    }

    async fn get_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<ConversationSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn update_session(&self, session: &ConversationSession) -> Result<(), RepositoryError> {
        let agent = serde_json::to_string(&session.agent)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            r#"UPDATE sessions
               SET agent = ?, active = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(agent)
        .bind(session.active as i64)
        .bind(format_datetime(&session.updated_at))
        .bind(session.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        // Messages and wizard state go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
        token_cost: u32,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        let last: Option<String> = sqlx::query_scalar(
            "SELECT created_at FROM messages WHERE session_id = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(session_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_err)?;

        let mut created_at = Utc::now();
        if let Some(last) = last.as_deref().map(parse_datetime).transpose()? {
            if created_at <= last {
                created_at = last + Duration::nanoseconds(1);
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

        sqlx::query(
            r#"INSERT INTO messages (id, session_id, role, content, token_cost, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(session_id.to_string())
        .bind(role.to_string())
        .bind(content)
        .bind(token_cost as i64)
        .bind(format_datetime(&created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
            other => query_err(other),
        })?;

        tx.commit().await.map_err(query_err)?;
        Ok(message)
    }

    async fn recent_messages(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM messages WHERE session_id = ? ORDER BY seq DESC LIMIT ?
               ) ORDER BY seq ASC"#,
        )
        .bind(session_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = MessageRow::from_row(row).map_err(query_err)?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn get_wizard(&self, session_id: &Uuid) -> Result<Option<WizardState>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM wizard_states WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let wizard_row = WizardRow::from_row(&row).map_err(query_err)?;
                Ok(Some(wizard_row.into_state()?))
            }
            None => Ok(None),
        }
    }

    async fn save_wizard(&self, state: &WizardState) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO wizard_states
                   (session_id, stage, name, description, category, city, last_error, correcting, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(session_id) DO UPDATE SET
                   stage = excluded.stage,
                   name = excluded.name,
                   description = excluded.description,
                   category = excluded.category,
                   city = excluded.city,
                   last_error = excluded.last_error,
                   correcting = excluded.correcting,
                   updated_at = excluded.updated_at"#,
        )
        .bind(state.session_id.to_string())
        .bind(state.stage.to_string())
        .bind(&state.fields.name)
        .bind(&state.fields.description)
        .bind(&state.fields.category)
        .bind(&state.fields.city)
        .bind(&state.last_error)
        .bind(state.correcting as i64)
        .bind(format_datetime(&state.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
            other => query_err(other),
        })?;

        Ok(())
    }

    async fn delete_wizard(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM wizard_states WHERE session_id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        Ok(())
    }
}
