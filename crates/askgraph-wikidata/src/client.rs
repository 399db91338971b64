//! Blocking HTTP client for the Wikidata endpoints.

use crate::config::WikidataConfig;
use crate::throttle::Throttle;
use crate::wire::{parse_entities_response, parse_search_response, parse_sparql_response};
use askgraph_core::error::ServiceError;
use askgraph_core::service::{
    Candidate, DetailRequest, EntityDetail, EntityRecord, EntitySearch, GraphQuery, Row,
    SearchRequest,
};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// `wbgetentities` accepts at most this many ids per request.
const MAX_IDS_PER_REQUEST: usize = 50;

/// Error bodies are truncated to this many characters.
const MAX_ERROR_BODY: usize = 512;

const SPARQL_JSON: &str = "application/sparql-results+json";

pub struct WikidataClient {
    http: Client,
    config: WikidataConfig,
    throttle: Throttle,
}

impl WikidataClient {
    pub fn new(config: WikidataConfig) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ServiceError::Client(format!("invalid user agent: {e}")))?,
        );
        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::Client(format!("failed to build http client: {e}")))?;
        let throttle = Throttle::new(config.request_delay);
        Ok(Self {
            http,
            config,
            throttle,
        })
    }

    pub fn config(&self) -> &WikidataConfig {
        &self.config
    }

    fn get_json(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        accept: &str,
        timeout: Duration,
    ) -> Result<Value, ServiceError> {
        self.throttle.run(|| {
            tracing::debug!(endpoint, ?params, "remote call");
            let resp = self
                .http
                .get(endpoint)
                .query(params)
                .header(ACCEPT, accept)
                .timeout(timeout)
                .send()
                .map_err(from_reqwest)?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().unwrap_or_default();
                return Err(ServiceError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(MAX_ERROR_BODY).collect(),
                });
            }
            resp.json::<Value>().map_err(from_reqwest)
        })
    }

    fn api_call(&self, params: &[(&str, &str)]) -> Result<Value, ServiceError> {
        self.get_json(
            &self.config.api_url,
            params,
            "application/json",
            self.config.search_timeout,
        )
    }
}

impl EntitySearch for WikidataClient {
    fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, ServiceError> {
        let limit = request.limit.to_string();
        let body = self.api_call(&[
            ("action", "wbsearchentities"),
            ("format", "json"),
            ("language", request.language.as_str()),
            ("search", request.text.as_str()),
            ("limit", limit.as_str()),
        ])?;
        parse_search_response(&body)
    }
}

impl EntityDetail for WikidataClient {
    fn entities(
        &self,
        request: &DetailRequest,
    ) -> Result<BTreeMap<String, EntityRecord>, ServiceError> {
        let props = request
            .props
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("|");

        let mut out = BTreeMap::new();
        for chunk in request.ids.chunks(MAX_IDS_PER_REQUEST) {
            let ids = chunk.join("|");
            let body = self.api_call(&[
                ("action", "wbgetentities"),
                ("format", "json"),
                ("ids", ids.as_str()),
                ("props", props.as_str()),
                ("languages", request.language.as_str()),
            ])?;
            out.extend(parse_entities_response(&body)?);
        }
        Ok(out)
    }
}

impl GraphQuery for WikidataClient {
    fn execute(&self, query: &str) -> Result<Vec<Row>, ServiceError> {
        let body = self.get_json(
            &self.config.sparql_url,
            &[("query", query)],
            SPARQL_JSON,
            self.config.query_timeout,
        )?;
        parse_sparql_response(&body)
    }
}

fn from_reqwest(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout(err.to_string())
    } else if err.is_decode() {
        ServiceError::Decode(err.to_string())
    } else if err.is_builder() {
        ServiceError::Client(err.to_string())
    } else if let Some(status) = err.status() {
        ServiceError::Status {
            status: status.as_u16(),
            body: err.to_string(),
        }
    } else {
        ServiceError::Transport(err.to_string())
    }
}
