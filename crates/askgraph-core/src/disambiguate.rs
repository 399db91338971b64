//! Candidate disambiguation: pick one identifier among lexically similar hits.
//!
//! Four short-circuiting stages, cheapest first:
//!
//! 1. **Exact label**: first candidate whose trimmed, lower-cased label equals
//!    the mention.
//! 2. **Description keyword**: for each candidate (in order), for each of the
//!    intent's type keywords (in order), the first description containing a
//!    keyword wins. The loop nesting is observable: a later candidate that
//!    matches *any* keyword beats an earlier one that matches none.
//! 3. **Type relation**: for each priority keyword (outer), for each candidate
//!    (inner), fetch the candidate's instance-of claims, look up the labels of
//!    the referenced types and accept the candidate if one contains the keyword.
//!    A failing lookup only makes that candidate inconclusive.
//! 4. **Fallback**: the first candidate.
//!
//! The result is always an id from the input slice.

use crate::error::ServiceError;
use crate::intent::Intent;
use crate::service::{Candidate, DetailRequest, EntityDetail, PropertyGroup};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Type keywords for stage 3, most specific first.
pub const TYPE_PRIORITY: &[&str] = &[
    "sovereign state",
    "country",
    "nation",
    "state",
    "province",
    "city",
    "administrative territorial entity",
];

/// Wikidata "instance of".
pub const INSTANCE_OF: &str = "P31";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisambiguatorConfig {
    pub type_priority: Vec<String>,
    pub instance_of_property: String,
    /// Language of the type labels compared in stage 3.
    pub language: String,
    /// Run the candidate checks of one keyword pass on the rayon pool.
    pub parallel_relation_checks: bool,
    /// Remember fetched type labels for the duration of one call.
    pub relation_cache: bool,
}

impl Default for DisambiguatorConfig {
    fn default() -> Self {
        Self {
            type_priority: TYPE_PRIORITY.iter().map(|s| s.to_string()).collect(),
            instance_of_property: INSTANCE_OF.to_string(),
            language: "en".to_string(),
            parallel_relation_checks: false,
            relation_cache: true,
        }
    }
}

/// Which stage produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ExactLabel,
    DescriptionKeyword,
    TypeRelation,
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ExactLabel => "exact label",
            Stage::DescriptionKeyword => "description keyword",
            Stage::TypeRelation => "type relation",
            Stage::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub id: String,
    /// Position of the chosen candidate in the input slice.
    pub index: usize,
    pub stage: Stage,
    /// The keyword that decided stage 2/3, if any.
    pub keyword: Option<String>,
}

/// Outcome of one stage-3 relation check for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Confirmed,
    Rejected,
    /// Transient failure (timeout, transport, 429/5xx).
    Inconclusive(ServiceError),
    /// Non-transient failure (malformed response, API error).
    Failed(ServiceError),
}

impl Verdict {
    fn from_error(err: ServiceError) -> Self {
        if err.is_transient() {
            Verdict::Inconclusive(err)
        } else {
            Verdict::Failed(err)
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Verdict::Confirmed)
    }
}

/// Lower-cased type labels per candidate id, scoped to one `decide` call.
struct TypeLabelMemo {
    enabled: bool,
    labels: Mutex<HashMap<String, Vec<String>>>,
}

impl TypeLabelMemo {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            labels: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, id: &str) -> Option<Vec<String>> {
        if !self.enabled {
            return None;
        }
        self.labels.lock().get(id).cloned()
    }

    fn put(&self, id: &str, labels: &[String]) {
        if self.enabled {
            self.labels.lock().insert(id.to_string(), labels.to_vec());
        }
    }
}

pub struct Disambiguator<'a> {
    detail: &'a dyn EntityDetail,
    config: DisambiguatorConfig,
}

impl<'a> Disambiguator<'a> {
    pub fn new(detail: &'a dyn EntityDetail) -> Self {
        Self {
            detail,
            config: DisambiguatorConfig::default(),
        }
    }

    pub fn config(mut self, config: DisambiguatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel_relation_checks = parallel;
        self
    }

    pub fn keyword_language(&self) -> &str {
        &self.config.language
    }

    /// `candidates` with descriptions replaced by the ones in the keyword
    /// language. Candidates without such a description keep theirs.
    pub fn with_keyword_descriptions(
        &self,
        candidates: &[Candidate],
    ) -> Result<Vec<Candidate>, ServiceError> {
        let language = self.config.language.as_str();
        let request = DetailRequest {
            ids: candidates.iter().map(|c| c.id.clone()).collect(),
            props: vec![PropertyGroup::Descriptions],
            language: language.to_string(),
        };
        let records = self.detail.entities(&request)?;
        Ok(candidates
            .iter()
            .map(|candidate| {
                let mut localized = candidate.clone();
                if let Some(description) = records
                    .get(&candidate.id)
                    .and_then(|record| record.description(language))
                {
                    localized.description = Some(description.to_string());
                }
                localized
            })
            .collect())
    }

    /// The chosen identifier, or `None` for an empty candidate list.
    pub fn disambiguate(
        &self,
        candidates: &[Candidate],
        intent: Option<Intent>,
        mention_lower: &str,
    ) -> Option<String> {
        self.decide(candidates, intent, mention_lower)
            .map(|decision| decision.id)
    }

    /// Like `disambiguate`, but also reports which stage decided.
    pub fn decide(
        &self,
        candidates: &[Candidate],
        intent: Option<Intent>,
        mention_lower: &str,
    ) -> Option<Decision> {
        let first = candidates.first()?;

        if let Some(index) = exact_label_match(candidates, mention_lower) {
            return Some(self.decision(candidates, index, Stage::ExactLabel, None));
        }

        let keywords = intent.map(Intent::type_keywords).unwrap_or(&[]);
        if let Some((index, keyword)) = description_match(candidates, keywords) {
            return Some(self.decision(
                candidates,
                index,
                Stage::DescriptionKeyword,
                Some(keyword.to_string()),
            ));
        }

        if let Some((index, keyword)) = self.type_relation_match(candidates) {
            return Some(self.decision(candidates, index, Stage::TypeRelation, Some(keyword)));
        }

        tracing::debug!(id = %first.id, "no stage decided; falling back to top candidate");
        Some(Decision {
            id: first.id.clone(),
            index: 0,
            stage: Stage::Fallback,
            keyword: None,
        })
    }

    fn decision(
        &self,
        candidates: &[Candidate],
        index: usize,
        stage: Stage,
        keyword: Option<String>,
    ) -> Decision {
        let id = candidates[index].id.clone();
        tracing::debug!(
            id = %id,
            index,
            stage = %stage,
            keyword = keyword.as_deref().unwrap_or(""),
            "candidate selected"
        );
        Decision {
            id,
            index,
            stage,
            keyword,
        }
    }

    fn type_relation_match(&self, candidates: &[Candidate]) -> Option<(usize, String)> {
        let memo = TypeLabelMemo::new(self.config.relation_cache);

        for keyword in &self.config.type_priority {
            let winner = if self.config.parallel_relation_checks {
                // Collect the whole pass, then pick by original order so the
                // outcome matches the sequential scan.
                let verdicts: Vec<Verdict> = candidates
                    .par_iter()
                    .map(|candidate| self.check_candidate(candidate, keyword, &memo))
                    .collect();
                verdicts
                    .iter()
                    .zip(candidates)
                    .for_each(|(verdict, candidate)| log_verdict(candidate, keyword, verdict));
                verdicts.iter().position(Verdict::is_confirmed)
            } else {
                candidates.iter().position(|candidate| {
                    let verdict = self.check_candidate(candidate, keyword, &memo);
                    log_verdict(candidate, keyword, &verdict);
                    verdict.is_confirmed()
                })
            };

            if let Some(index) = winner {
                return Some((index, keyword.clone()));
            }
        }
        None
    }

    /// Does `candidate` have an instance-of type whose label contains `keyword`?
    pub fn verify(&self, candidate: &Candidate, keyword: &str) -> Verdict {
        self.check_candidate(candidate, keyword, &TypeLabelMemo::new(false))
    }

    fn check_candidate(&self, candidate: &Candidate, keyword: &str, memo: &TypeLabelMemo) -> Verdict {
        let labels = match memo.get(&candidate.id) {
            Some(labels) => labels,
            None => match self.fetch_type_labels(&candidate.id) {
                Ok(labels) => {
                    memo.put(&candidate.id, &labels);
                    labels
                }
                Err(err) => return Verdict::from_error(err),
            },
        };

        if labels.iter().any(|label| label.contains(keyword)) {
            Verdict::Confirmed
        } else {
            Verdict::Rejected
        }
    }

    /// Lower-cased labels of every entity the candidate is an instance of.
    fn fetch_type_labels(&self, id: &str) -> Result<Vec<String>, ServiceError> {
        let language = &self.config.language;
        let entities = self
            .detail
            .entities(&DetailRequest::claims(id, language.as_str()))?;

        let targets = entities
            .get(id)
            .map(|record| record.claims.referenced_entities(&self.config.instance_of_property))
            .unwrap_or_default();
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let types = self
            .detail
            .entities(&DetailRequest::labels(targets, language.as_str()))?;
        Ok(types
            .values()
            .map(|record| record.label(language).unwrap_or("").to_lowercase())
            .collect())
    }
}

fn exact_label_match(candidates: &[Candidate], mention_lower: &str) -> Option<usize> {
    candidates.iter().position(|c| {
        c.label
            .as_deref()
            .is_some_and(|label| label.trim().to_lowercase() == mention_lower)
    })
}

fn description_match<'k>(
    candidates: &[Candidate],
    keywords: &[&'k str],
) -> Option<(usize, &'k str)> {
    for (index, candidate) in candidates.iter().enumerate() {
        let description = candidate
            .description
            .as_deref()
            .unwrap_or("")
            .to_lowercase();
        for keyword in keywords {
            if description.contains(keyword) {
                return Some((index, *keyword));
            }
        }
    }
    None
}

fn log_verdict(candidate: &Candidate, keyword: &str, verdict: &Verdict) {
    match verdict {
        Verdict::Confirmed | Verdict::Rejected => {
            tracing::trace!(id = %candidate.id, keyword, ?verdict, "type relation check");
        }
        Verdict::Inconclusive(err) => {
            tracing::warn!(id = %candidate.id, keyword, error = %err, "type relation check inconclusive; skipping candidate");
        }
        Verdict::Failed(err) => {
            tracing::warn!(id = %candidate.id, keyword, error = %err, "type relation check failed; skipping candidate");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ClaimValue, EntityRecord, PropertyGroup};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory detail service: candidate → instance-of targets, target → label.
    #[derive(Default)]
    struct StubDetail {
        instance_of: HashMap<String, Vec<String>>,
        labels: HashMap<String, String>,
        descriptions: HashMap<String, String>,
        failing: HashMap<String, ServiceError>,
        calls: AtomicUsize,
    }

    impl StubDetail {
        fn typed(mut self, id: &str, types: &[(&str, &str)]) -> Self {
            self.instance_of.insert(
                id.to_string(),
                types.iter().map(|(t, _)| t.to_string()).collect(),
            );
            for (t, label) in types {
                self.labels.insert(t.to_string(), label.to_string());
            }
            self
        }

        fn described(mut self, id: &str, description: &str) -> Self {
            self.descriptions.insert(id.to_string(), description.to_string());
            self
        }

        fn failing(mut self, id: &str, err: ServiceError) -> Self {
            self.failing.insert(id.to_string(), err);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EntityDetail for StubDetail {
        fn entities(
            &self,
            request: &DetailRequest,
        ) -> Result<BTreeMap<String, EntityRecord>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let wants_claims = request.props.contains(&PropertyGroup::Claims);
            let wants_labels = request.props.contains(&PropertyGroup::Labels);
            let wants_descriptions = request.props.contains(&PropertyGroup::Descriptions);
            if wants_claims {
                if let Some(err) = request.ids.iter().find_map(|id| self.failing.get(id)) {
                    return Err(err.clone());
                }
            }

            let mut out = BTreeMap::new();
            for id in &request.ids {
                let mut record = EntityRecord::default();
                if wants_claims {
                    if let Some(types) = self.instance_of.get(id) {
                        record.claims.insert(
                            INSTANCE_OF,
                            types.iter().map(|t| ClaimValue::Entity(t.clone())).collect(),
                        );
                    }
                }
                if wants_labels {
                    if let Some(label) = self.labels.get(id) {
                        record.labels.insert(request.language.clone(), label.clone());
                    }
                }
                if wants_descriptions {
                    if let Some(description) = self.descriptions.get(id) {
                        record
                            .descriptions
                            .insert(request.language.clone(), description.clone());
                    }
                }
                out.insert(id.clone(), record);
            }
            Ok(out)
        }
    }

    fn cand(id: &str, label: &str, description: &str) -> Candidate {
        Candidate::new(id)
            .with_label(label)
            .with_description(description)
    }

    #[test]
    fn keyword_descriptions_replace_only_fetched_ones() {
        let detail = StubDetail::default().described("Q230", "country in the Caucasus");
        let d = Disambiguator::new(&detail);
        let candidates = [
            cand("Q1428", "Georgia (Bundesstaat)", "Bundesstaat der USA"),
            cand("Q230", "Georgien", "Staat in Vorderasien"),
        ];

        let localized = d.with_keyword_descriptions(&candidates).expect("descriptions");
        assert_eq!(detail.calls(), 1);
        assert_eq!(localized[0], candidates[0]);
        assert_eq!(localized[1].label.as_deref(), Some("Georgien"));
        assert_eq!(
            localized[1].description.as_deref(),
            Some("country in the Caucasus")
        );
        assert_eq!(d.keyword_language(), "en");
    }

    #[test]
    fn empty_candidates_give_none() {
        let detail = StubDetail::default();
        let d = Disambiguator::new(&detail);
        assert_eq!(d.disambiguate(&[], Some(Intent::Capital), "france"), None);
        assert_eq!(d.disambiguate(&[], None, ""), None);
        assert_eq!(detail.calls(), 0);
    }

    #[test]
    fn identical_exact_labels_resolve_to_first_listed() {
        let detail = StubDetail::default();
        let candidates = vec![
            cand("Q1", "Georgia", "U.S. state"),
            cand("Q2", "Georgia", "sovereign state"),
        ];
        let decision = Disambiguator::new(&detail)
            .decide(&candidates, Some(Intent::Capital), "georgia")
            .expect("decision");
        assert_eq!(decision.id, "Q1");
        assert_eq!(decision.stage, Stage::ExactLabel);
        assert_eq!(detail.calls(), 0);
    }

    #[test]
    fn exact_label_match_trims_and_ignores_case() {
        let detail = StubDetail::default();
        let candidates = vec![
            cand("Q1", "Paris Hilton", "media personality"),
            cand("Q90", "  PARIS ", "capital of France"),
        ];
        let d = Disambiguator::new(&detail);
        assert_eq!(
            d.disambiguate(&candidates, Some(Intent::Capital), "paris"),
            Some("Q90".to_string())
        );
    }

    #[test]
    fn description_keyword_picks_later_candidate() {
        let detail = StubDetail::default();
        let candidates = vec![
            cand("Q1428", "Georgia (U.S. state)", "state of the United States of America"),
            cand("Q230", "Georgia (country)", "sovereign state in the Caucasus"),
        ];
        let decision = Disambiguator::new(&detail)
            .decide(&candidates, Some(Intent::Capital), "georgia")
            .expect("decision");
        assert_eq!(decision.id, "Q230");
        assert_eq!(decision.stage, Stage::DescriptionKeyword);
        assert_eq!(decision.keyword.as_deref(), Some("sovereign state"));
        assert_eq!(detail.calls(), 0);
    }

    #[test]
    fn description_scan_is_candidate_outer_keyword_inner() {
        let detail = StubDetail::default();
        // "city" is the last population keyword and "nation" an earlier one,
        // but the first candidate to match anything wins.
        let candidates = vec![
            cand("Q10", "Springfield (a)", "city in Illinois"),
            cand("Q11", "Springfield (b)", "fictional nation"),
        ];
        let decision = Disambiguator::new(&detail)
            .decide(&candidates, Some(Intent::PopulationLatest), "springfield")
            .expect("decision");
        assert_eq!(decision.id, "Q10");
        assert_eq!(decision.keyword.as_deref(), Some("city"));
    }

    #[test]
    fn missing_description_counts_as_empty() {
        let detail = StubDetail::default();
        let candidates = vec![
            Candidate::new("Q1").with_label("Jersey"),
            cand("Q2", "Jersey (island)", "island country"),
        ];
        assert_eq!(
            Disambiguator::new(&detail).disambiguate(&candidates, Some(Intent::Capital), "jersey x"),
            Some("Q2".to_string())
        );
    }

    #[test]
    fn no_intent_skips_description_stage() {
        let detail = StubDetail::default().typed("Q2", &[("Q515", "city")]);
        let candidates = vec![
            cand("Q1", "Lima (a)", "sovereign state"),
            cand("Q2", "Lima (b)", "capital of Peru"),
        ];
        let decision = Disambiguator::new(&detail)
            .decide(&candidates, None, "lima")
            .expect("decision");
        assert_eq!(decision.id, "Q2");
        assert_eq!(decision.stage, Stage::TypeRelation);
        assert_eq!(decision.keyword.as_deref(), Some("city"));
    }

    #[test]
    fn type_priority_is_the_outer_loop() {
        let detail = StubDetail::default()
            .typed("Q1", &[("Q515", "city")])
            .typed("Q2", &[("Q3624078", "sovereign state")]);
        let candidates = vec![cand("Q1", "X (a)", ""), cand("Q2", "X (b)", "")];
        let decision = Disambiguator::new(&detail)
            .decide(&candidates, Some(Intent::Capital), "x")
            .expect("decision");
        assert_eq!(decision.id, "Q2");
        assert_eq!(decision.keyword.as_deref(), Some("sovereign state"));
    }

    #[test]
    fn failing_candidate_is_skipped_not_propagated() {
        let detail = StubDetail::default()
            .failing("Q1", ServiceError::Timeout("claims".into()))
            .failing("Q2", ServiceError::Decode("truncated json".into()))
            .typed("Q3", &[("Q6256", "country")]);
        let candidates = vec![cand("Q1", "a", ""), cand("Q2", "b", ""), cand("Q3", "c", "")];
        let d = Disambiguator::new(&detail);
        assert_eq!(d.disambiguate(&candidates, None, "z"), Some("Q3".to_string()));
        assert!(matches!(d.verify(&candidates[0], "country"), Verdict::Inconclusive(_)));
        assert!(matches!(d.verify(&candidates[1], "country"), Verdict::Failed(_)));
        assert_eq!(d.verify(&candidates[2], "country"), Verdict::Confirmed);
        assert_eq!(d.verify(&candidates[2], "city"), Verdict::Rejected);
    }

    #[test]
    fn fallback_is_first_candidate() {
        let detail = StubDetail::default()
            .typed("Q2", &[("Q8502", "mountain")])
            .failing("Q3", ServiceError::Transport("reset".into()));
        let candidates = vec![cand("Q1", "a", ""), cand("Q2", "b", ""), cand("Q3", "c", "")];
        let decision = Disambiguator::new(&detail)
            .decide(&candidates, Some(Intent::Capital), "nothing matches")
            .expect("decision");
        assert_eq!(decision.id, "Q1");
        assert_eq!(decision.index, 0);
        assert_eq!(decision.stage, Stage::Fallback);
    }

    #[test]
    fn parallel_pass_selects_by_original_order() {
        let detail = StubDetail::default()
            .typed("Q1", &[("Q515", "city")])
            .failing("Q2", ServiceError::Timeout("claims".into()))
            .typed("Q3", &[("Q6256", "country")])
            .typed("Q4", &[("Q6256", "country")]);
        let candidates = vec![
            cand("Q1", "a", ""),
            cand("Q2", "b", ""),
            cand("Q3", "c", ""),
            cand("Q4", "d", ""),
        ];
        let sequential = Disambiguator::new(&detail).decide(&candidates, None, "z");
        let parallel = Disambiguator::new(&detail)
            .parallel(true)
            .decide(&candidates, None, "z");
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.map(|d| d.id), Some("Q3".to_string()));
    }

    #[test]
    fn relation_memo_avoids_refetching_between_passes() {
        let candidates = vec![cand("Q1", "a", "")];

        let cached = StubDetail::default().typed("Q1", &[("Q23442", "island")]);
        Disambiguator::new(&cached).decide(&candidates, None, "z");
        assert_eq!(cached.calls(), 2);

        let uncached = StubDetail::default().typed("Q1", &[("Q23442", "island")]);
        Disambiguator::new(&uncached)
            .config(DisambiguatorConfig {
                relation_cache: false,
                ..DisambiguatorConfig::default()
            })
            .decide(&candidates, None, "z");
        assert_eq!(uncached.calls(), 2 * TYPE_PRIORITY.len());
    }

    #[test]
    fn candidate_without_instance_of_skips_label_lookup() {
        let detail = StubDetail::default();
        let d = Disambiguator::new(&detail);
        assert_eq!(d.verify(&cand("Q1", "a", ""), "country"), Verdict::Rejected);
        assert_eq!(detail.calls(), 1);
    }
}
