use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Look a person up with the web tools and write a profile.
    Research,
    /// Small talk or a short answer; no tools.
    Conversational,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Research => "research",
            Intent::Conversational => "conversational",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides how a query should be handled.
pub trait QueryPolicy: Send + Sync {
    fn classify(&self, query: &str) -> Intent;
}

/// Keyword and name-shape heuristics.
///
/// Greetings and short acknowledgements are conversational. Research verbs
/// ("research", "who is", "look up", ...) or something shaped like a person's
/// name (two or more capitalized words, initials allowed) mean research.
/// Anything else defaults to conversational.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicPolicy;

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hiya",
    "yo",
    "good morning",
    "good afternoon",
    "good evening",
    "thanks",
    "thank you",
    "thx",
    "ok",
    "okay",
    "yes",
    "no",
    "sure",
    "cool",
    "great",
    "bye",
    "goodbye",
    "how are you",
    "what can you do",
    "who are you",
    "help",
];

const RESEARCH_SIGNALS: &[&str] = &[
    "research",
    "look up",
    "lookup",
    "find out",
    "find info",
    "find information",
    "background on",
    "background check",
    "dossier",
    "profile of",
    "tell me about",
    "who is",
    "who was",
    "search for",
    "investigate",
];

#[allow(clippy::expect_used)]
static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z'\-]+(?:\s+(?:[A-Z]\.|[A-Z][a-z'\-]+))+\b").expect("person name pattern")
});

fn normalize(query: &str) -> String {
    query
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl QueryPolicy for HeuristicPolicy {
    fn classify(&self, query: &str) -> Intent {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return Intent::Conversational;
        }

        let greeting = GREETINGS.iter().any(|g| {
            normalized == *g
                || normalized
                    .strip_prefix(g)
                    .is_some_and(|rest| rest.starts_with([' ', ',', '!']) && rest.len() <= 12)
        });
        if greeting && !RESEARCH_SIGNALS.iter().any(|s| normalized.contains(s)) {
            return Intent::Conversational;
        }

        if RESEARCH_SIGNALS.iter().any(|s| normalized.contains(s)) {
            return Intent::Research;
        }
        if PERSON_NAME.is_match(query.trim()) {
            return Intent::Research;
        }
        Intent::Conversational
    }
}
