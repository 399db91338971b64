//! Endpoint, timeout and pacing configuration.

use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://www.wikidata.org/w/api.php";
pub const DEFAULT_SPARQL_URL: &str = "https://query.wikidata.org/sparql";
pub const DEFAULT_USER_AGENT: &str =
    concat!("askgraph/", env!("CARGO_PKG_VERSION"), " (+https://github.com/askgraph/askgraph)");

pub const ENV_API_URL: &str = "ASKGRAPH_API_URL";
pub const ENV_SPARQL_URL: &str = "ASKGRAPH_SPARQL_URL";
pub const ENV_USER_AGENT: &str = "ASKGRAPH_USER_AGENT";
pub const ENV_REQUEST_DELAY_MS: &str = "ASKGRAPH_REQUEST_DELAY_MS";
pub const ENV_SEARCH_TIMEOUT_SECS: &str = "ASKGRAPH_SEARCH_TIMEOUT_SECS";
pub const ENV_QUERY_TIMEOUT_SECS: &str = "ASKGRAPH_QUERY_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikidataConfig {
    /// Action API endpoint (search + entity detail).
    pub api_url: String,
    /// Query Service endpoint.
    pub sparql_url: String,
    pub user_agent: String,
    /// Timeout for search and detail lookups.
    pub search_timeout: Duration,
    /// Timeout for SPARQL execution.
    pub query_timeout: Duration,
    /// Minimum pause around every remote call.
    pub request_delay: Duration,
}

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            sparql_url: DEFAULT_SPARQL_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(20),
            request_delay: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: expected a non-negative integer, got `{value}`")]
    InvalidNumber { var: String, value: String },
    #[error("{field}: invalid url `{value}`: {reason}")]
    InvalidUrl {
        field: String,
        value: String,
        reason: String,
    },
    #[error("user agent must not be empty")]
    EmptyUserAgent,
}

impl WikidataConfig {
    /// Defaults overridden by `ASKGRAPH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(url) = get(ENV_SPARQL_URL) {
            config.sparql_url = url;
        }
        if let Some(agent) = get(ENV_USER_AGENT) {
            config.user_agent = agent;
        }
        if let Some(ms) = get(ENV_REQUEST_DELAY_MS) {
            config.request_delay = Duration::from_millis(parse_number(ENV_REQUEST_DELAY_MS, &ms)?);
        }
        if let Some(secs) = get(ENV_SEARCH_TIMEOUT_SECS) {
            config.search_timeout = Duration::from_secs(parse_number(ENV_SEARCH_TIMEOUT_SECS, &secs)?);
        }
        if let Some(secs) = get(ENV_QUERY_TIMEOUT_SECS) {
            config.query_timeout = Duration::from_secs(parse_number(ENV_QUERY_TIMEOUT_SECS, &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("api_url", &self.api_url)?;
        check_url("sparql_url", &self.sparql_url)?;
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyUserAgent);
        }
        Ok(())
    }
}

fn parse_number(var: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        var: var.to_string(),
        value: value.to_string(),
    })
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field: field.to_string(),
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    Ok(())
}
