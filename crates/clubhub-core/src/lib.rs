//! Business logic and port definitions for ClubHub.
//!
//! This crate defines the "ports" (repository, directory and provider
//! traits) that the infrastructure layer implements. It depends only on
//! `clubhub-types` -- never on `clubhub-infra` or any database/IO crate.

pub mod agent;
pub mod club;
pub mod llm;
pub mod orchestrator;
pub mod session;
pub mod tool;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;
