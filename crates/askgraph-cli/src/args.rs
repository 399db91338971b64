//! Flags shared by every subcommand that talks to Wikidata.
//!
//! Precedence: flag > `ASKGRAPH_*` environment > built-in default.

use anyhow::Result;
use askgraph_core::{DisambiguatorConfig, ResolverConfig};
use askgraph_wikidata::WikidataConfig;
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug, Default, Clone)]
pub struct ServiceArgs {
    /// Action API endpoint (search and entity detail)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Query Service endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub sparql_url: Option<String>,

    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Search language; type keywords are always matched in English
    #[arg(long, global = true, value_name = "CODE")]
    pub language: Option<String>,

    /// Maximum number of search hits considered per mention
    #[arg(long, global = true, value_name = "N")]
    pub search_limit: Option<usize>,

    /// Minimum pause between remote calls
    #[arg(long, global = true, value_name = "MS")]
    pub request_delay_ms: Option<u64>,

    #[arg(long, global = true, value_name = "SECS")]
    pub search_timeout_secs: Option<u64>,

    #[arg(long, global = true, value_name = "SECS")]
    pub query_timeout_secs: Option<u64>,

    /// Run the type-relation checks of one keyword pass concurrently
    #[arg(long, global = true)]
    pub parallel_relation_checks: bool,

    /// Re-fetch type labels for every keyword pass
    #[arg(long, global = true)]
    pub no_relation_cache: bool,
}

impl ServiceArgs {
    /// Apply the endpoint flags on top of `base` and validate the result.
    pub fn wikidata_config(&self, base: WikidataConfig) -> Result<WikidataConfig> {
        let mut config = base;
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(url) = &self.sparql_url {
            config.sparql_url = url.clone();
        }
        if let Some(agent) = &self.user_agent {
            config.user_agent = agent.clone();
        }
        if let Some(ms) = self.request_delay_ms {
            config.request_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.search_timeout_secs {
            config.search_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.query_timeout_secs {
            config.query_timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn resolver_config(&self) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::default();
        if let Some(language) = &self.language {
            let language = language.trim();
            if language.is_empty() {
                anyhow::bail!("--language must not be empty");
            }
            config.language = language.to_string();
        }
        if let Some(limit) = self.search_limit {
            if limit == 0 {
                anyhow::bail!("--search-limit must be at least 1");
            }
            config.search_limit = limit;
        }
        config.disambiguator = DisambiguatorConfig {
            parallel_relation_checks: self.parallel_relation_checks,
            relation_cache: !self.no_relation_cache,
            ..DisambiguatorConfig::default()
        };
        Ok(config)
    }
}
