//! Shared domain types for ClubHub.
//!
//! This crate contains the data model of the conversational agent layer:
//! sessions and their agent assignment, the message log, wizard state,
//! club records, LLM request/response shapes, and the error enums.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod chat;
pub mod club;
pub mod config;
pub mod error;
pub mod llm;
pub mod tool;
pub mod wizard;
