//! Response decoding for the Action API and the Query Service.
//!
//! Pure functions over `serde_json::Value`, so every shape the endpoints
//! emit can be tested without a network.

use askgraph_core::error::ServiceError;
use askgraph_core::service::{Candidate, ClaimSet, ClaimValue, EntityRecord, Row};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

/// The Action API reports failures as HTTP 200 with an `error` object.
fn check_api_error(body: &Value) -> Result<(), ServiceError> {
    let Some(error) = body.get("error") else {
        return Ok(());
    };
    let error: ApiError = serde_json::from_value(error.clone())
        .map_err(|e| ServiceError::Decode(format!("unreadable api error: {e}")))?;
    Err(ServiceError::Api {
        code: error.code,
        info: error.info,
    })
}

// ============================================================================
// wbsearchentities
// ============================================================================

#[derive(Deserialize)]
struct SearchHit {
    id: Option<String>,
    label: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
}

/// Ordered candidates; hits without an id are dropped.
pub fn parse_search_response(body: &Value) -> Result<Vec<Candidate>, ServiceError> {
    check_api_error(body)?;
    let response: SearchResponse = serde_json::from_value(body.clone())
        .map_err(|e| ServiceError::Decode(format!("wbsearchentities: {e}")))?;
    Ok(response
        .search
        .into_iter()
        .filter_map(|hit| {
            let id = hit.id.filter(|id| !id.is_empty())?;
            Some(Candidate {
                id,
                label: hit.label,
                description: hit.description,
            })
        })
        .collect())
}

// ============================================================================
// wbgetentities
// ============================================================================

#[derive(Deserialize)]
struct Term {
    value: String,
}

#[derive(Deserialize)]
struct RawEntity {
    #[serde(default)]
    missing: Option<Value>,
    #[serde(default)]
    labels: BTreeMap<String, Term>,
    #[serde(default)]
    descriptions: BTreeMap<String, Term>,
    #[serde(default)]
    claims: BTreeMap<String, Vec<RawClaim>>,
}

#[derive(Deserialize)]
struct RawClaim {
    mainsnak: RawSnak,
}

#[derive(Deserialize)]
struct RawSnak {
    #[serde(default)]
    snaktype: Option<String>,
    #[serde(default)]
    datavalue: Option<RawDataValue>,
}

#[derive(Deserialize)]
struct RawDataValue {
    #[serde(rename = "type")]
    kind: String,
    value: Value,
}

#[derive(Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: BTreeMap<String, RawEntity>,
}

/// id → record; ids the service reports as `missing` are left out.
pub fn parse_entities_response(
    body: &Value,
) -> Result<BTreeMap<String, EntityRecord>, ServiceError> {
    check_api_error(body)?;
    let response: EntitiesResponse = serde_json::from_value(body.clone())
        .map_err(|e| ServiceError::Decode(format!("wbgetentities: {e}")))?;

    Ok(response
        .entities
        .into_iter()
        .filter(|(_, entity)| entity.missing.is_none())
        .map(|(id, entity)| {
            let mut claims = ClaimSet::default();
            for (property, raw) in entity.claims {
                claims.insert(property, raw.into_iter().map(claim_value).collect());
            }
            let record = EntityRecord {
                labels: terms(entity.labels),
                descriptions: terms(entity.descriptions),
                claims,
            };
            (id, record)
        })
        .collect())
}

fn terms(raw: BTreeMap<String, Term>) -> BTreeMap<String, String> {
    raw.into_iter().map(|(lang, term)| (lang, term.value)).collect()
}

fn claim_value(claim: RawClaim) -> ClaimValue {
    let snak = claim.mainsnak;
    if snak.snaktype.as_deref().is_some_and(|t| t != "value") {
        return ClaimValue::NoValue;
    }
    let Some(datavalue) = snak.datavalue else {
        return ClaimValue::NoValue;
    };
    if datavalue.kind == "wikibase-entityid" {
        if let Some(id) = datavalue.value.get("id").and_then(Value::as_str) {
            return ClaimValue::Entity(id.to_string());
        }
    }
    ClaimValue::Other(datavalue.value)
}

// ============================================================================
// SPARQL JSON results
// ============================================================================

#[derive(Deserialize, Default)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<Row>,
}

#[derive(Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    results: SparqlResults,
}

pub fn parse_sparql_response(body: &Value) -> Result<Vec<Row>, ServiceError> {
    let response: SparqlResponse = serde_json::from_value(body.clone())
        .map_err(|e| ServiceError::Decode(format!("sparql results: {e}")))?;
    Ok(response.results.bindings)
}
