use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Common short words that token streams glue together, with their spaced
/// form. Matched against whole lowercase tokens only.
const GLUED_WORDS: &[(&str, &str)] = &[
    ("inthe", "in the"),
    ("ofthe", "of the"),
    ("onthe", "on the"),
    ("tothe", "to the"),
    ("atthe", "at the"),
    ("forthe", "for the"),
    ("andthe", "and the"),
    ("fromthe", "from the"),
    ("withthe", "with the"),
    ("bythe", "by the"),
    ("isthe", "is the"),
    ("wasthe", "was the"),
    ("isa", "is a"),
    ("wasa", "was a"),
    ("ofa", "of a"),
    ("asan", "as an"),
    ("isan", "is an"),
    ("wasan", "was an"),
    ("andhe", "and he"),
    ("andshe", "and she"),
    ("hasbeen", "has been"),
    ("havebeen", "have been"),
];

/// Mixed-case names that must not be split at their inner capital.
const CAMEL_CASE_NAMES: &[&str] = &[
    "LinkedIn",
    "GitHub",
    "YouTube",
    "TikTok",
    "WhatsApp",
    "PayPal",
    "JavaScript",
    "TypeScript",
    "OpenAI",
    "TechCrunch",
    "PhD",
    "iPhone",
    "iPad",
    "eBay",
    "McDonald",
    "MacArthur",
    "DeepMind",
    "SpaceX",
];

#[allow(clippy::expect_used)]
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("token pattern"));

#[allow(clippy::expect_used)]
static LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]{2,})([A-Z][a-z]+)").expect("case boundary pattern"));

#[allow(clippy::expect_used)]
static GLUED_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]{2,}[.!?])([A-Z][a-z]+)").expect("sentence glue pattern"));

/// Best-effort repair of words that lost their separating space when
/// streamed fragments were concatenated.
///
/// Inserts a space at a lowercase-to-uppercase transition ("engineerShe"),
/// after sentence punctuation glued to a capitalized word ("Ohio.She"), and
/// inside a small dictionary of glued short words ("inthe"). Tokens that look
/// like URLs, emails, code or known mixed-case names are left alone, and all
/// whitespace is preserved.
pub fn repair_word_boundaries(text: &str) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| repair_token(&caps[0]))
        .into_owned()
}

fn repair_token(token: &str) -> String {
    if looks_technical(token) {
        return token.to_string();
    }

    let (lead, core, trail) = split_punctuation(token);
    if let Some((_, spaced)) = GLUED_WORDS.iter().find(|(glued, _)| *glued == core) {
        return format!("{lead}{spaced}{trail}");
    }
    if CAMEL_CASE_NAMES.iter().any(|name| core.contains(name)) {
        return token.to_string();
    }

    let token = GLUED_SENTENCE.replace_all(token, "$1 $2");
    LOWER_UPPER.replace_all(&token, "$1 $2").into_owned()
}

fn looks_technical(token: &str) -> bool {
    token.contains("://")
        || token.contains('@')
        || token.contains('_')
        || token.contains('`')
        || token.starts_with("www.")
}

fn split_punctuation(token: &str) -> (&str, &str, &str) {
    let start = token
        .find(|c: char| c.is_alphanumeric())
        .unwrap_or(token.len());
    let end = token
        .rfind(|c: char| c.is_alphanumeric())
        .map_or(start, |i| i + token[i..].chars().next().map_or(1, char::len_utf8));
    let end = end.max(start);
    (&token[..start], &token[start..end], &token[end..])
}
