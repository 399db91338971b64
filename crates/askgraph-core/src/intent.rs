//! Intent classification.
//!
//! A question is mapped onto one of a closed set of intents by an **ordered**
//! pattern table: the first pattern that matches wins. Order is the tie-break
//! policy (e.g. "Which continent is the capital of X in?" is a `capital`
//! question because the capital pattern is listed first), so the table must
//! not be reordered casually.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// The semantic question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Capital,
    Continent,
    PopulationLatest,
    HeadOfState,
    ContainsAdmin,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::Capital,
        Intent::Continent,
        Intent::PopulationLatest,
        Intent::HeadOfState,
        Intent::ContainsAdmin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Capital => "capital",
            Intent::Continent => "continent",
            Intent::PopulationLatest => "population_latest",
            Intent::HeadOfState => "head_of_state",
            Intent::ContainsAdmin => "contains_admin",
        }
    }

    /// Entity-type keywords preferred when picking among candidates, most
    /// preferred first. Matched as substrings of lower-cased descriptions.
    pub fn type_keywords(self) -> &'static [&'static str] {
        match self {
            Intent::Capital | Intent::Continent | Intent::HeadOfState => {
                &["country", "sovereign state", "nation"]
            }
            Intent::PopulationLatest => &["country", "sovereign state", "nation", "city"],
            Intent::ContainsAdmin => &[
                "country",
                "administrative territorial entity",
                "state",
                "province",
                "region",
            ],
        }
    }

    /// The SPARQL template for this intent (contains `{QID}` exactly once).
    pub fn template(self) -> &'static str {
        crate::template::template_for(self)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent `{0}` (expected one of: capital, continent, population_latest, head_of_state, contains_admin)")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == wanted)
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}

// (pattern, intent), evaluated top to bottom.
const INTENT_PATTERNS: &[(&str, Intent)] = &[
    (r"(?i)\bcapital of\b|\bwhat is the capital of\b", Intent::Capital),
    (r"(?i)\bpopulation of\b|\bhow many people\b", Intent::PopulationLatest),
    (
        r"(?i)\bhead of state\b|\bpresident of\b|\bprime minister of\b",
        Intent::HeadOfState,
    ),
    (
        r"(?i)\bcontinent of\b|\bwhich continent\b|\bin continent\b",
        Intent::Continent,
    ),
    (
        r"(?i)\bcontains\b|\bwhich states\b|\bwhich provinces\b|\badministrative entities\b",
        Intent::ContainsAdmin,
    ),
];

fn pattern_table() -> &'static [(Regex, Intent)] {
    static TABLE: OnceLock<Vec<(Regex, Intent)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        INTENT_PATTERNS
            .iter()
            .map(|(pattern, intent)| {
                (
                    Regex::new(pattern).expect("intent pattern table is static and valid"),
                    *intent,
                )
            })
            .collect()
    })
}

/// Classify a question. `None` means "unsupported question shape": a terminal,
/// user-visible outcome, not something to retry.
pub fn classify(text: &str) -> Option<Intent> {
    pattern_table()
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, intent)| *intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_intent_from_a_sample_question() {
        let samples = [
            ("What is the capital of France?", Intent::Capital),
            ("capital of peru", Intent::Capital),
            ("What is the population of India?", Intent::PopulationLatest),
            ("How many people live in Chile?", Intent::PopulationLatest),
            ("Who is the head of state of Spain?", Intent::HeadOfState),
            ("Who is the president of France?", Intent::HeadOfState),
            ("Who is the prime minister of Canada?", Intent::HeadOfState),
            ("What is the continent of Egypt?", Intent::Continent),
            ("Which continent is Japan in?", Intent::Continent),
            ("Is Brazil in continent South America?", Intent::Continent),
            ("What does Germany contains?", Intent::ContainsAdmin),
            ("Which states are in Mexico?", Intent::ContainsAdmin),
            ("Which provinces does Canada have?", Intent::ContainsAdmin),
            (
                "Which administrative entities does India contain?",
                Intent::ContainsAdmin,
            ),
        ];
        for (question, expected) in samples {
            assert_eq!(classify(question), Some(expected), "{question}");
        }
    }

    #[test]
    fn unrelated_text_is_unrecognized() {
        assert_eq!(classify("hello world"), None);
        assert_eq!(classify(""), None);
        // word boundaries: "capitalize" is not "capital of"
        assert_eq!(classify("please capitalize offers"), None);
    }

    #[test]
    fn earlier_pattern_wins_on_overlap() {
        assert_eq!(
            classify("Which continent is the capital of Kenya in?"),
            Some(Intent::Capital)
        );
        assert_eq!(
            classify("What is the population of the capital of Peru?"),
            Some(Intent::Capital)
        );
        assert_eq!(
            classify("Which continent contains the president of Mali?"),
            Some(Intent::HeadOfState)
        );
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(classify("WHAT IS THE CAPITAL OF FRANCE"), Some(Intent::Capital));
        assert_eq!(classify("wHiCh CoNtInEnT is Japan in"), Some(Intent::Continent));
    }

    #[test]
    fn intent_tags_round_trip_through_from_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>(), Ok(intent));
        }
        assert_eq!("Head-Of-State".parse::<Intent>(), Ok(Intent::HeadOfState));
        assert!("weather".parse::<Intent>().is_err());
    }

    #[test]
    fn every_intent_has_keywords() {
        for intent in Intent::ALL {
            assert!(!intent.type_keywords().is_empty(), "{intent}");
        }
    }
}
