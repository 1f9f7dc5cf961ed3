//! Keyword router: picks an agent for a message and decides when a sticky
//! agent must be dropped.

use clubhub_types::agent::AgentState;
use clubhub_types::chat::{ChatMessage, MessageRole};
use clubhub_types::wizard::WizardStage;

use crate::wizard::validate;

use super::catalog::{CLUB_SPECIALIST, MENTOR_SPECIALIST, SUPPORT_SPECIALIST};

/// Substring keywords mapped to an agent. Rules are tried in order.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    pub agent: String,
    pub keywords: Vec<String>,
}

impl RoutingRule {
    pub fn new(agent: &str, keywords: &[&str]) -> Self {
        Self {
            agent: agent.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

const CLUB_KEYWORDS: &[&str] = &[
    "club", "community", "communities", "join", "event", "клуб", "сообществ", "создать",
    "создай", "мероприят",
];

const SUPPORT_KEYWORDS: &[&str] = &[
    "help", "error", "bug", "login", "log in", "password", "not working", "problem",
    "ошибк", "не работает", "помощ", "помоги", "пароль",
];

const MENTOR_KEYWORDS: &[&str] = &[
    "learn", "skill", "develop", "career", "mentor", "grow", "развит", "навык", "учить",
    "карьер",
];

/// Words or phrases that end the current agent's task.
const RESET_KEYWORDS: &[&str] = &[
    "stop", "cancel", "enough", "other topic", "another topic", "стоп", "хватит", "отмена",
    "достаточно", "другая тема", "другой вопрос",
];

/// Why a sticky agent was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetReason {
    /// The user asked to stop or change the subject.
    TopicChange,
    /// The agent handled too many turns without finishing.
    Stuck { user_turns: u32 },
}

#[derive(Debug, Clone)]
pub struct AgentRouter {
    rules: Vec<RoutingRule>,
    reset_keywords: Vec<String>,
    default_agent: String,
    reset_after_user_turns: u32,
}

impl AgentRouter {
    /// Router with the built-in keyword sets.
    pub fn new(default_agent: impl Into<String>, reset_after_user_turns: u32) -> Self {
        Self::with_rules(
            vec![
                RoutingRule::new(CLUB_SPECIALIST, CLUB_KEYWORDS),
                RoutingRule::new(SUPPORT_SPECIALIST, SUPPORT_KEYWORDS),
                RoutingRule::new(MENTOR_SPECIALIST, MENTOR_KEYWORDS),
            ],
            default_agent,
            reset_after_user_turns,
        )
    }

    pub fn with_rules(
        rules: Vec<RoutingRule>,
        default_agent: impl Into<String>,
        reset_after_user_turns: u32,
    ) -> Self {
        Self {
            rules,
            reset_keywords: RESET_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            default_agent: default_agent.into(),
            reset_after_user_turns,
        }
    }

    /// Choose an agent for `message`.
    ///
    /// `recent_history` holds the turns before `message`, oldest first. It is
    /// consulted only when the message itself matches nothing, and only the
    /// latest previous user turn counts.
    pub fn route(&self, message: &str, recent_history: &[ChatMessage]) -> String {
        if let Some(agent) = self.classify(message) {
            return agent.to_string();
        }

        recent_history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .and_then(|m| self.classify(&m.content))
            .unwrap_or(self.default_agent.as_str())
            .to_string()
    }

    fn classify(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.agent.as_str())
    }

    /// Whether the message asks to stop or change the subject.
    ///
    /// Keywords match whole words so that "stopwatch" does not cancel a task.
    pub fn is_reset_request(&self, message: &str) -> bool {
        let normalized = normalize_words(message);
        self.reset_keywords
            .iter()
            .any(|k| normalized.contains(&format!(" {k} ")))
    }

    /// Decide whether the sticky `agent` must be dropped before handling
    /// `message`. `wizard_stage` is the session's wizard stage, if any.
    ///
    /// A message the wizard would accept as the club description is input,
    /// not a request: reset words inside it are ignored.
    pub fn reset_reason(
        &self,
        message: &str,
        agent: &AgentState,
        wizard_stage: Option<WizardStage>,
    ) -> Option<ResetReason> {
        let description_input = wizard_stage == Some(WizardStage::Description)
            && validate::validate_description(message).is_ok();
        if !description_input && self.is_reset_request(message) {
            return Some(ResetReason::TopicChange);
        }

        // A finished wizard releases the agent, so a sticky agent is never
        // exempt. `user_turns` counts turns already handled; this message
        // would be the next one.
        if agent.user_turns >= self.reset_after_user_turns {
            return Some(ResetReason::Stuck {
                user_turns: agent.user_turns,
            });
        }

        None
    }
}

/// Lower-cased words separated by single spaces, padded with a space on
/// both ends.
fn normalize_words(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {} ", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::catalog::ORCHESTRATOR;
    use chrono::Utc;
    use uuid::Uuid;

    fn router() -> AgentRouter {
        AgentRouter::new(ORCHESTRATOR, 15)
    }

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            session_id: Uuid::nil(),
            role: MessageRole::User,
            content: content.to_string(),
            token_cost: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_route_by_keywords() {
        let router = router();
        assert_eq!(router.route("I want to find a chess club", &[]), CLUB_SPECIALIST);
        assert_eq!(router.route("I want to create a club", &[]), CLUB_SPECIALIST);
        assert_eq!(router.route("My login is not working", &[]), SUPPORT_SPECIALIST);
        assert_eq!(router.route("I want to learn Python", &[]), MENTOR_SPECIALIST);
        assert_eq!(router.route("Хочу создать клуб", &[]), CLUB_SPECIALIST);
    }

    #[test]
    fn test_route_is_case_insensitive() {
        assert_eq!(router().route("CHESS CLUB please", &[]), CLUB_SPECIALIST);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Mentions both a club and help; club rules come first.
        assert_eq!(router().route("help me find a club", &[]), CLUB_SPECIALIST);
    }

    #[test]
    fn test_route_defaults_to_orchestrator() {
        assert_eq!(router().route("Hello", &[]), ORCHESTRATOR);
    }

    #[test]
    fn test_route_uses_latest_user_turn_when_message_is_vague() {
        let history = vec![user("I want to learn Rust"), user("Hmm, ok")];
        // Latest previous user turn has no keyword.
        assert_eq!(router().route("and then?", &history), ORCHESTRATOR);

        let history = vec![user("Hmm, ok"), user("my password does not work")];
        assert_eq!(router().route("and then?", &history), SUPPORT_SPECIALIST);
    }

    #[test]
    fn test_reset_keywords_match_whole_words() {
        let router = router();
        assert!(router.is_reset_request("stop"));
        assert!(router.is_reset_request("Please CANCEL this!"));
        assert!(router.is_reset_request("ok, enough."));
        assert!(router.is_reset_request("let's talk about another topic"));
        assert!(router.is_reset_request("Хватит"));
        assert!(!router.is_reset_request("I bought a stopwatch"));
        assert!(!router.is_reset_request("Chess Club"));
    }

    #[test]
    fn test_reset_on_topic_change() {
        let agent = AgentState::new(CLUB_SPECIALIST);
        assert_eq!(
            router().reset_reason("stop", &agent, Some(WizardStage::Description)),
            Some(ResetReason::TopicChange)
        );
    }

    #[test]
    fn test_sticky_below_threshold() {
        let mut agent = AgentState::new(CLUB_SPECIALIST);
        agent.user_turns = 14;
        assert_eq!(router().reset_reason("Almaty", &agent, Some(WizardStage::City)), None);
    }

    #[test]
    fn test_reset_when_stuck() {
        let mut agent = AgentState::new(CLUB_SPECIALIST);
        agent.user_turns = 15;
        assert_eq!(
            router().reset_reason("Almaty", &agent, Some(WizardStage::City)),
            Some(ResetReason::Stuck { user_turns: 15 })
        );
        assert_eq!(
            router().reset_reason("Almaty", &agent, None),
            Some(ResetReason::Stuck { user_turns: 15 })
        );
    }

    #[test]
    fn test_leftover_finished_wizard_does_not_exempt() {
        let mut agent = AgentState::new(CLUB_SPECIALIST);
        agent.user_turns = 20;
        assert_eq!(
            router().reset_reason("thanks", &agent, Some(WizardStage::Committed)),
            Some(ResetReason::Stuck { user_turns: 20 })
        );
    }

    #[test]
    fn test_reset_words_inside_description_are_ignored() {
        let agent = AgentState::new(CLUB_SPECIALIST);
        let description = format!(
            "We meet every Saturday to play chess and we never stop learning. {}",
            "Beginners are welcome and boards are provided. ".repeat(4)
        );
        assert!(router().is_reset_request(&description));
        assert_eq!(
            router().reset_reason(&description, &agent, Some(WizardStage::Description)),
            None
        );
        // Outside the description stage the same text still resets.
        assert_eq!(
            router().reset_reason(&description, &agent, Some(WizardStage::Category)),
            Some(ResetReason::TopicChange)
        );
        // A short "stop" is never a valid description.
        assert_eq!(
            router().reset_reason("stop", &agent, Some(WizardStage::Description)),
            Some(ResetReason::TopicChange)
        );
    }
}
