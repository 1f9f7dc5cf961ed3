//! Built-in platform knowledge served by the support and mentor tools.

use serde::Serialize;
use serde_json::{Value, json};

/// A help article from the built-in FAQ.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Article {
    pub title: &'static str,
    pub answer: &'static str,
    #[serde(skip)]
    keywords: &'static [&'static str],
}

const FAQ: &[Article] = &[
    Article {
        title: "Creating a club",
        answer: "Ask the assistant to create a club. You will be asked for a name, a \
                 description of at least 200 characters, a category and an optional city.",
        keywords: &["create", "club", "new club", "создать"],
    },
    Article {
        title: "Signing in",
        answer: "Use the Sign in button in the top right corner. If you forgot your \
                 password, choose 'Reset password' and follow the e-mail link.",
        keywords: &["login", "log in", "sign in", "password", "войти", "пароль"],
    },
    Article {
        title: "Creating an account",
        answer: "Choose 'Sign up', enter your e-mail and confirm it from the message we send.",
        keywords: &["register", "sign up", "account", "регистрация"],
    },
    Article {
        title: "Joining a club",
        answer: "Open the club page and press 'Join'. Private clubs need the owner's approval.",
        keywords: &["join", "member", "вступить"],
    },
    Article {
        title: "Reporting a problem",
        answer: "Describe what happened, the page you were on and the time. The support team \
                 answers within one business day.",
        keywords: &["bug", "error", "problem", "broken", "ошибка", "проблема"],
    },
];

/// Articles whose keywords or title match `query`, best match first.
pub fn search_articles(query: &str) -> Vec<Article> {
    let query = query.to_lowercase();
    let mut scored: Vec<(usize, Article)> = FAQ
        .iter()
        .filter_map(|article| {
            let mut score = article
                .keywords
                .iter()
                .filter(|kw| query.contains(*kw))
                .count();
            if !query.is_empty() && article.title.to_lowercase().contains(&query) {
                score += 1;
            }
            (score > 0).then_some((score, *article))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, article)| article).collect()
}

/// Operational status of the platform services.
pub fn platform_status() -> Value {
    json!({
        "status": "operational",
        "services": {
            "web": "operational",
            "clubs": "operational",
            "messaging": "operational",
            "assistant": "operational"
        },
        "incidents": []
    })
}

struct Track {
    goal: &'static str,
    keywords: &'static [&'static str],
    steps: &'static [&'static str],
}

const TRACKS: &[Track] = &[
    Track {
        goal: "programming",
        keywords: &["program", "code", "coding", "developer", "программ"],
        steps: &[
            "Pick one language and finish an introductory course",
            "Build a small project you use yourself",
            "Join a programming club to review code with others",
        ],
    },
    Track {
        goal: "public speaking",
        keywords: &["speak", "speech", "presentation", "выступ"],
        steps: &[
            "Record a two-minute talk and watch it back",
            "Speak at a small club meetup",
            "Ask for one concrete piece of feedback after every talk",
        ],
    },
    Track {
        goal: "leadership",
        keywords: &["lead", "leader", "manage", "team", "лидер"],
        steps: &[
            "Organize one club event end to end",
            "Delegate a task and follow up on it",
            "Find a mentor who already leads a community",
        ],
    },
];

const GENERAL_STEPS: &[&str] = &[
    "Write down one goal for the next three months",
    "Join a club related to that goal",
    "Review your progress every week",
];

/// Recommendation steps for `goal`, or general advice when nothing matches.
pub fn recommendations(goal: Option<&str>) -> Value {
    let lowered = goal.map(str::to_lowercase).unwrap_or_default();
    let track = TRACKS
        .iter()
        .find(|track| track.keywords.iter().any(|kw| lowered.contains(kw)));
    match track {
        Some(track) => json!({"goal": track.goal, "recommendations": track.steps}),
        None => json!({"goal": "general", "recommendations": GENERAL_STEPS}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_articles_ranks_matches() {
        let found = search_articles("I forgot my password and cannot log in");
        assert_eq!(found[0].title, "Signing in");
        assert!(search_articles("weather tomorrow").is_empty());
    }

    #[test]
    fn test_recommendations_by_goal() {
        assert_eq!(
            recommendations(Some("I want to learn programming"))["goal"],
            "programming"
        );
        assert_eq!(recommendations(None)["goal"], "general");
    }
}
