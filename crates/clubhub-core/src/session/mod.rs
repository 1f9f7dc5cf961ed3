//! Session store, message log and per-session locks.
//!
//! `SessionRepository` is the storage port; `SessionStore` adds the
//! lookup-or-create semantics used by the orchestrator.

pub mod locks;
pub mod repository;
pub mod store;
