//! End-to-end resolution: question → intent/mention → QID → SPARQL → answers.
//!
//! Resolutions are independent: the resolver holds only configuration and
//! borrowed service handles, so one instance can serve many questions.

use crate::answer::{normalize, Answer};
use crate::disambiguate::{Decision, Disambiguator, DisambiguatorConfig};
use crate::error::ResolveError;
use crate::intent::{classify, Intent};
use crate::mention::extract;
use crate::service::{Candidate, EntityDetail, EntitySearch, GraphQuery, SearchRequest};
use crate::template::{assemble, Identifier};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Language for entity search (labels and descriptions of the hits).
    pub language: String,
    /// Maximum number of search candidates considered.
    pub search_limit: usize,
    pub disambiguator: DisambiguatorConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            search_limit: 5,
            disambiguator: DisambiguatorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQuery {
    pub intent: Intent,
    pub mention: String,
    pub identifier: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub resolved: ResolvedQuery,
    pub answers: Vec<Answer>,
    /// Present only when `answers` is empty, so a caller can retry with a
    /// different identifier.
    pub candidates: Option<Vec<Candidate>>,
}

impl Resolution {
    /// Disambiguation and query succeeded but the graph held no matching facts.
    pub fn is_empty_answer(&self) -> bool {
        self.answers.is_empty()
    }
}

pub struct Resolver<'a> {
    search: &'a dyn EntitySearch,
    detail: &'a dyn EntityDetail,
    graph: &'a dyn GraphQuery,
    config: ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(
        search: &'a dyn EntitySearch,
        detail: &'a dyn EntityDetail,
        graph: &'a dyn GraphQuery,
    ) -> Self {
        Self {
            search,
            detail,
            graph,
            config: ResolverConfig::default(),
        }
    }

    /// One backend serving all three contracts (e.g. a Wikidata client).
    pub fn with_backend<B>(backend: &'a B) -> Self
    where
        B: EntitySearch + EntityDetail + GraphQuery,
    {
        Self::new(backend, backend, backend)
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn resolver_config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Type labels are read in `disambiguator.language` (the language of the
    /// type keywords), not in the search language.
    pub fn disambiguator(&self) -> Disambiguator<'a> {
        Disambiguator::new(self.detail).config(self.config.disambiguator.clone())
    }

    /// Choose among `candidates` as `resolve` does.
    ///
    /// When the search ran in another language than the keywords, stage 2
    /// reads descriptions re-fetched in the keyword language. If that fetch
    /// fails the search descriptions are used as they are.
    pub fn decide(
        &self,
        candidates: &[Candidate],
        intent: Option<Intent>,
        mention_lower: &str,
    ) -> Option<Decision> {
        let disambiguator = self.disambiguator();
        if candidates.is_empty()
            || self.config.language == disambiguator.keyword_language()
        {
            return disambiguator.decide(candidates, intent, mention_lower);
        }

        match disambiguator.with_keyword_descriptions(candidates) {
            Ok(localized) => disambiguator.decide(&localized, intent, mention_lower),
            Err(err) => {
                tracing::warn!(
                    search_language = %self.config.language,
                    keyword_language = disambiguator.keyword_language(),
                    error = %err,
                    "could not fetch descriptions in the keyword language"
                );
                disambiguator.decide(candidates, intent, mention_lower)
            }
        }
    }

    /// Raw search hits for a mention, most relevant first.
    pub fn candidates(&self, mention: &str) -> Result<Vec<Candidate>, ResolveError> {
        let request = SearchRequest {
            text: mention.to_string(),
            language: self.config.language.clone(),
            limit: self.config.search_limit,
        };
        let candidates = self.search.search(&request)?;
        tracing::debug!(mention, count = candidates.len(), "entity search");
        Ok(candidates)
    }

    pub fn resolve(&self, question: &str) -> Result<Resolution, ResolveError> {
        let question = question.trim();
        let intent = classify(question).ok_or(ResolveError::UnrecognizedIntent)?;
        let mention = extract(question);
        tracing::debug!(%intent, mention = %mention, "question parsed");

        let candidates = self.candidates(&mention)?;
        let mention_lower = mention.trim().to_lowercase();
        let Some(identifier) = self
            .decide(&candidates, Some(intent), &mention_lower)
            .map(|decision| decision.id)
        else {
            return Err(ResolveError::EntityNotFound {
                mention,
                candidates,
            });
        };

        self.answer(intent, mention, identifier, candidates)
    }

    /// Resolve with a caller-chosen identifier instead of search + disambiguation.
    pub fn resolve_with_identifier(
        &self,
        question: &str,
        identifier: &Identifier,
    ) -> Result<Resolution, ResolveError> {
        let question = question.trim();
        let intent = classify(question).ok_or(ResolveError::UnrecognizedIntent)?;
        let mention = extract(question);
        self.answer(intent, mention, identifier.to_string(), Vec::new())
    }

    fn answer(
        &self,
        intent: Intent,
        mention: String,
        identifier: String,
        candidates: Vec<Candidate>,
    ) -> Result<Resolution, ResolveError> {
        let query = assemble(intent, &identifier);
        let rows = self.graph.execute(&query)?;
        let answers = normalize(&rows);
        tracing::info!(
            %intent,
            identifier = %identifier,
            rows = rows.len(),
            answers = answers.len(),
            "question resolved"
        );

        let candidates = answers.is_empty().then_some(candidates);
        Ok(Resolution {
            resolved: ResolvedQuery {
                intent,
                mention,
                identifier,
                query,
            },
            answers,
            candidates,
        })
    }
}

/// Flat, serializable view of a resolution outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Candidate>>,
}

impl From<&Result<Resolution, ResolveError>> for ResolveReport {
    fn from(outcome: &Result<Resolution, ResolveError>) -> Self {
        match outcome {
            Ok(resolution) => ResolveReport {
                error: None,
                intent: Some(resolution.resolved.intent),
                entity_label: Some(resolution.resolved.mention.clone()),
                qid: Some(resolution.resolved.identifier.clone()),
                sparql: Some(resolution.resolved.query.clone()),
                answers: Some(resolution.answers.clone()),
                candidates: resolution.candidates.clone(),
            },
            Err(err) => ResolveReport {
                error: Some(err.to_string()),
                candidates: err.candidates().map(<[Candidate]>::to_vec),
                ..ResolveReport::default()
            },
        }
    }
}
