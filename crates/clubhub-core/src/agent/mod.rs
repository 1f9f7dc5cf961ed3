//! Agents: the static catalogue and the keyword router.

pub mod catalog;
pub mod registry;
pub mod router;
