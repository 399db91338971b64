//! SPARQL templates and query assembly.
//!
//! Assembly is plain placeholder substitution. Identifiers that reach
//! `assemble` must come from the search service's candidate set (or pass
//! `Identifier::parse`), never from raw question text.

use crate::error::IdentifierError;
use crate::intent::Intent;
use std::fmt;
use std::str::FromStr;

pub const QID_PLACEHOLDER: &str = "{QID}";

const CAPITAL: &str = "SELECT ?answer ?answerLabel WHERE { wd:{QID} wdt:P36 ?answer . SERVICE wikibase:label { bd:serviceParam wikibase:language \"en\". } } LIMIT 10";
const CONTINENT: &str = "SELECT ?answer ?answerLabel WHERE { wd:{QID} wdt:P30 ?answer . SERVICE wikibase:label { bd:serviceParam wikibase:language \"en\". } } LIMIT 10";
const POPULATION_LATEST: &str = "SELECT ?population ?point WHERE { wd:{QID} p:P1082 ?ps . ?ps ps:P1082 ?population . OPTIONAL { ?ps pq:P585 ?point. } } ORDER BY DESC(?point) LIMIT 1";
const HEAD_OF_STATE: &str = "SELECT ?answer ?answerLabel WHERE { wd:{QID} wdt:P35 ?answer . SERVICE wikibase:label { bd:serviceParam wikibase:language \"en\". } } LIMIT 10";
const CONTAINS_ADMIN: &str = "SELECT ?answer ?answerLabel WHERE { wd:{QID} wdt:P150 ?answer . SERVICE wikibase:label { bd:serviceParam wikibase:language \"en\". } } LIMIT 10";

pub(crate) fn template_for(intent: Intent) -> &'static str {
    match intent {
        Intent::Capital => CAPITAL,
        Intent::Continent => CONTINENT,
        Intent::PopulationLatest => POPULATION_LATEST,
        Intent::HeadOfState => HEAD_OF_STATE,
        Intent::ContainsAdmin => CONTAINS_ADMIN,
    }
}

/// Fill the intent's template with `identifier`.
pub fn assemble(intent: Intent, identifier: &str) -> String {
    intent.template().replace(QID_PLACEHOLDER, identifier)
}

/// A caller-supplied Wikidata item id (`Q` followed by a positive integer).
///
/// Search results are trusted as-is; this type guards the path where a human
/// picks a different identifier by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        let text = text.trim();
        let Some(digits) = text.strip_prefix('Q').or_else(|| text.strip_prefix('q')) else {
            return Err(IdentifierError(text.to_string()));
        };
        let valid = !digits.is_empty()
            && !digits.starts_with('0')
            && digits.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(IdentifierError(text.to_string()));
        }
        Ok(Self(format!("Q{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_has_exactly_one_placeholder() {
        for intent in Intent::ALL {
            let template = intent.template();
            assert!(!template.is_empty());
            assert_eq!(template.matches(QID_PLACEHOLDER).count(), 1, "{intent}");
        }
    }

    #[test]
    fn assemble_substitutes_the_identifier() {
        for intent in Intent::ALL {
            let q = assemble(intent, "Q142");
            assert!(q.contains("wd:Q142"), "{q}");
            assert!(!q.contains(QID_PLACEHOLDER), "{q}");
        }
        assert!(assemble(Intent::Capital, "Q142").contains("wdt:P36"));
        assert!(assemble(Intent::PopulationLatest, "Q668").contains("ORDER BY DESC(?point)"));
    }

    #[test]
    fn identifier_accepts_item_ids_only() {
        assert_eq!(Identifier::parse("Q142").map(|i| i.to_string()), Ok("Q142".to_string()));
        assert_eq!(Identifier::parse(" q90 ").map(|i| i.to_string()), Ok("Q90".to_string()));
        for bad in ["", "Q", "Q0", "Q01", "P31", "Q142 }", "Q1;DROP", "142"] {
            assert!(Identifier::parse(bad).is_err(), "{bad}");
        }
    }
}
