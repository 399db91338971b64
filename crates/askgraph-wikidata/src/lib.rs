//! Wikidata adapters for Askgraph (boundary layer).
//!
//! Implements the core service contracts against the public endpoints:
//!
//! - `EntitySearch` → Action API `wbsearchentities`
//! - `EntityDetail` → Action API `wbgetentities`
//! - `GraphQuery`   → Wikidata Query Service (SPARQL, JSON results)
//!
//! Every remote call is blocking, carries its own timeout, and passes through
//! a shared `Throttle` so the minimum inter-call delay holds even when the
//! disambiguator fans out across threads. No retries happen here.

pub mod client;
pub mod config;
pub mod throttle;
pub mod wire;

pub use client::WikidataClient;
pub use config::{ConfigError, WikidataConfig};
pub use throttle::Throttle;
