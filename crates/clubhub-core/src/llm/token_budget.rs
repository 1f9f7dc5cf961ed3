//! Token-bounded context assembly for LLM calls.
//!
//! Token counts are estimated (~4 chars per token); the budget covers the
//! system prompt, the retained history, and the current user message.

use clubhub_types::llm::{Message, MessageRole};

/// Rough token estimate for a piece of text.
pub fn estimate_tokens(text: &str) -> u32 {
    // Conservative estimate: ~4 chars per token, never zero for non-empty text.
    let chars = text.chars().count() as u32;
    chars.div_ceil(4)
}

/// Bounds the context handed to the model.
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow {
    pub max_tokens: u32,
}

impl ContextWindow {
    pub fn new(max_tokens: u32) -> Self {
        Self { max_tokens }
    }

    /// Build `[system, ..history, user(current)]`, dropping the oldest
    /// non-system history turns until the estimate fits the budget.
    ///
    /// The system prompt and the current message are always kept, even if
    /// together they exceed the budget.
    pub fn assemble(&self, system_prompt: &str, history: &[Message], current: &str) -> Vec<Message> {
        let fixed = estimate_tokens(system_prompt) + estimate_tokens(current);
        let mut available = self.max_tokens.saturating_sub(fixed);

        // Walk newest to oldest, keeping turns while they fit.
        let mut kept: Vec<&Message> = Vec::new();
        for message in history.iter().rev() {
            if message.role == MessageRole::System {
                continue;
            }
            let cost = estimate_tokens(&message.content);
            if cost > available {
                break;
            }
            available -= cost;
            kept.push(message);
        }
        kept.reverse();

        let mut messages = Vec::with_capacity(kept.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(kept.into_iter().cloned());
        messages.push(Message::user(current));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens("abcdefghi"), 3);
    }

    #[test]
    fn test_assemble_keeps_everything_within_budget() {
        let window = ContextWindow::new(1_000);
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let messages = window.assemble("You are helpful.", &history, "find a club");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[3].content, "find a club");
    }

    #[test]
    fn test_assemble_drops_oldest_first() {
        // system (4 chars -> 1) + current (4 chars -> 1) leaves 8 tokens.
        let window = ContextWindow::new(10);
        let history = vec![
            Message::user("a".repeat(20)),      // 5 tokens, oldest
            Message::assistant("b".repeat(16)), // 4 tokens
            Message::user("c".repeat(16)),      // 4 tokens, newest
        ];
        let messages = window.assemble("sys!", &history, "now!");

        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys!", "bbbbbbbbbbbbbbbb", "cccccccccccccccc", "now!"]);
    }

    #[test]
    fn test_assemble_skips_stored_system_turns() {
        let window = ContextWindow::new(1_000);
        let history = vec![Message::system("old prompt"), Message::user("hi")];
        let messages = window.assemble("new prompt", &history, "again");

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "new prompt");
        assert_eq!(messages[1].content, "hi");
    }

    #[test]
    fn test_assemble_always_keeps_system_and_current() {
        let window = ContextWindow::new(1);
        let history = vec![Message::user("x".repeat(100))];
        let messages = window.assemble("a long system prompt", &history, "a long user message");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
    }
}
