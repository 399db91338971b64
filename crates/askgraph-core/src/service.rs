//! Remote service contracts (entity search, entity detail, graph query).
//!
//! The core never talks HTTP itself; it only sees these traits. The Wikidata
//! adapters live in `askgraph-wikidata`, tests use in-memory stubs.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Entity search
// ============================================================================

/// One lexical search hit, most relevant first in a result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            description: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub text: String,
    pub language: String,
    pub limit: usize,
}

pub trait EntitySearch: Send + Sync {
    fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, ServiceError>;
}

// ============================================================================
// Entity detail
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyGroup {
    Labels,
    Descriptions,
    Claims,
}

impl PropertyGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyGroup::Labels => "labels",
            PropertyGroup::Descriptions => "descriptions",
            PropertyGroup::Claims => "claims",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub ids: Vec<String>,
    pub props: Vec<PropertyGroup>,
    pub language: String,
}

impl DetailRequest {
    pub fn claims(id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            ids: vec![id.into()],
            props: vec![PropertyGroup::Claims],
            language: language.into(),
        }
    }

    pub fn labels(ids: Vec<String>, language: impl Into<String>) -> Self {
        Self {
            ids,
            props: vec![PropertyGroup::Labels],
            language: language.into(),
        }
    }
}

/// Value of one claim's main snak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClaimValue {
    /// Reference to another entity (the "statement" relation).
    Entity(String),
    /// Any other datavalue (string, quantity, time, ...), kept raw.
    Other(serde_json::Value),
    /// `novalue` / `somevalue` snaks.
    NoValue,
}

impl ClaimValue {
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            ClaimValue::Entity(id) => Some(id),
            _ => None,
        }
    }
}

/// Property id → claim values, in the order the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet(pub BTreeMap<String, Vec<ClaimValue>>);

impl ClaimSet {
    pub fn get(&self, property: &str) -> &[ClaimValue] {
        self.0.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, property: impl Into<String>, values: Vec<ClaimValue>) {
        self.0.insert(property.into(), values);
    }

    /// Entity ids referenced by `property`'s claims (non-entity values skipped).
    pub fn referenced_entities(&self, property: &str) -> Vec<String> {
        self.get(property)
            .iter()
            .filter_map(ClaimValue::entity_id)
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// language → label
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// language → description
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
    #[serde(default)]
    pub claims: ClaimSet,
}

impl EntityRecord {
    pub fn label(&self, language: &str) -> Option<&str> {
        self.labels.get(language).map(String::as_str)
    }

    pub fn description(&self, language: &str) -> Option<&str> {
        self.descriptions.get(language).map(String::as_str)
    }
}

pub trait EntityDetail: Send + Sync {
    /// Ids the service does not know are simply absent from the map.
    fn entities(
        &self,
        request: &DetailRequest,
    ) -> Result<BTreeMap<String, EntityRecord>, ServiceError>;
}

// ============================================================================
// Graph query
// ============================================================================

/// One bound value of a SPARQL JSON result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, rename = "xml:lang", skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Binding {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }
}

/// Variable name → bound value.
pub type Row = BTreeMap<String, Binding>;

pub trait GraphQuery: Send + Sync {
    fn execute(&self, query: &str) -> Result<Vec<Row>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_entities_skips_non_entity_values() {
        let mut claims = ClaimSet::default();
        claims.insert(
            "P31",
            vec![
                ClaimValue::Entity("Q6256".into()),
                ClaimValue::NoValue,
                ClaimValue::Other(serde_json::json!("text")),
                ClaimValue::Entity("Q3624078".into()),
            ],
        );
        assert_eq!(claims.referenced_entities("P31"), vec!["Q6256", "Q3624078"]);
        assert!(claims.referenced_entities("P36").is_empty());
    }

    #[test]
    fn binding_deserializes_sparql_json() {
        let b: Binding = serde_json::from_value(serde_json::json!({
            "type": "literal",
            "value": "Paris",
            "xml:lang": "en"
        }))
        .expect("binding");
        assert_eq!(b.value, "Paris");
        assert_eq!(b.lang.as_deref(), Some("en"));
        assert_eq!(b.datatype, None);
    }
}
