//! Mention extraction: find the text span that names the question's entity.
//!
//! Question phrasing is regular enough that a handful of ordered
//! phrase-boundary patterns, with a token-based fallback, beats a general
//! parser here. Extraction is independent of the classified intent.

use regex::Regex;
use std::sync::OnceLock;

// Evaluated top to bottom against the trimmed question; group 1 is the mention.
const MENTION_PATTERNS: &[&str] = &[
    r"(?i)of\s+(.+?)[?.!]?$",
    r"(?i)which\s+continent\s+is\s+(.+?)\s+in[?.!]?$",
    r"(?i)which\s+.*\s+does\s+(.+?)\s+contain[?.!]?$",
    r"(?i)does\s+(.+?)\s+contain[?.!]?$",
    r"(?i)in\s+(.+?)[?.!]?$",
    r"(?i)is\s+(.+?)\s+in[?.!]?$",
    r"(?i)who is the .* of\s+(.+?)[?.!]?$",
];

struct Patterns {
    phrases: Vec<Regex>,
    trailing_verb: Regex,
    token: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        phrases: MENTION_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("mention pattern table is static and valid"))
            .collect(),
        trailing_verb: Regex::new(r"(?i)\b(?:contains|contain)$")
            .expect("static trailing-verb pattern"),
        token: Regex::new(r"[A-Za-z0-9\x{00C0}-\x{024F}]+").expect("static token pattern"),
    })
}

/// Extract the entity mention from a question. Never fails.
///
/// The first phrase pattern that matches commits its span, even if nothing
/// is left of it after a dangling `contain`/`contains`, whitespace and
/// trailing sentence punctuation are dropped. With no pattern match the last
/// two alphanumeric tokens are joined instead.
pub fn extract(text: &str) -> String {
    let text = text.trim();
    let patterns = patterns();

    for re in &patterns.phrases {
        if let Some(span) = re.captures(text).and_then(|caps| caps.get(1)) {
            return clean_span(span.as_str(), &patterns.trailing_verb);
        }
    }

    last_tokens(text, &patterns.token)
}

fn clean_span(span: &str, trailing_verb: &Regex) -> String {
    let span = span.trim();
    let span = trailing_verb.replace(span, "");
    span.trim()
        .trim_end_matches(['?', '.', '!'])
        .trim_end()
        .to_string()
}

fn last_tokens(text: &str, token: &Regex) -> String {
    let parts: Vec<&str> = token.find_iter(text).map(|m| m.as_str()).collect();
    if parts.is_empty() {
        return text.to_string();
    }
    parts[parts.len().saturating_sub(2)..].join(" ")
}
