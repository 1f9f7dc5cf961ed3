//! LLM provider abstractions and the completion gateway.
//!
//! - `LlmProvider`: RPITIT trait for concrete backends
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `ContextWindow`: token-bounded context assembly
//! - `LlmGateway`: one agent turn against the backend, including the tool loop

pub mod box_provider;
pub mod gateway;
pub mod provider;
pub mod token_budget;

#[cfg(test)]
pub(crate) mod mock;
