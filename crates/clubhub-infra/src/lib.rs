//! Infrastructure layer for ClubHub.
//!
//! Contains implementations of the ports defined in `clubhub-core`:
//! SQLite storage for sessions, messages, wizard state and clubs, the
//! OpenAI-compatible chat-completion client, and configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;
