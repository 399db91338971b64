//! Askgraph core: deterministic question → SPARQL resolution.
//!
//! This crate is intentionally **not** an NLP stack: it is a small set of
//! ordered pattern tables plus one piece of real decision logic (entity
//! disambiguation) that together turn a factual English question into a
//! Wikidata query.
//!
//! ## Pipeline
//!
//! ```text
//! question ──► intent::classify ──► Intent ─────────────┐
//!     │                                                   ▼
//!     └────► mention::extract ──► mention ──► EntitySearch ──► candidates
//!                                                         │
//!                          disambiguate::Disambiguator ◄──┘  (may consult EntityDetail)
//!                                     │
//!                                     ▼
//!                 template::assemble(intent, QID) ──► GraphQuery ──► rows
//!                                                                     │
//!                                         answer::normalize ◄─────────┘
//! ```
//!
//! Remote services are traits (`service`), so the pipeline can run against
//! the Wikidata adapters (`askgraph-wikidata`) or in-memory stubs in tests.

pub mod answer;
pub mod disambiguate;
pub mod error;
pub mod intent;
pub mod mention;
pub mod resolver;
pub mod service;
pub mod template;

pub use answer::{normalize, Answer};
pub use disambiguate::{Disambiguator, DisambiguatorConfig, Verdict};
pub use error::{IdentifierError, ResolveError, ServiceError};
pub use intent::{classify, Intent};
pub use mention::extract;
pub use resolver::{ResolveReport, Resolution, ResolvedQuery, Resolver, ResolverConfig};
pub use service::{
    Binding, Candidate, ClaimSet, ClaimValue, DetailRequest, EntityDetail, EntityRecord,
    EntitySearch, GraphQuery, PropertyGroup, Row, SearchRequest,
};
pub use template::{assemble, Identifier};
