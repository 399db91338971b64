//! Error taxonomy for resolution and remote calls.

use crate::service::Candidate;

/// Failure of a single remote call (search, detail lookup, query execution).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("api error {code}: {info}")]
    Api { code: String, info: String },
    #[error("client error: {0}")]
    Client(String),
}

impl ServiceError {
    /// Timeouts, connection failures, rate limiting and server-side errors.
    ///
    /// Everything else (bad payloads, client-side 4xx, API error objects)
    /// would fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Timeout(_) | ServiceError::Transport(_) => true,
            ServiceError::Status { status, .. } => *status == 429 || *status >= 500,
            ServiceError::Decode(_) | ServiceError::Api { .. } | ServiceError::Client(_) => false,
        }
    }
}

/// Terminal outcomes of `Resolver::resolve`.
///
/// An empty answer set is *not* an error: see `Resolution::is_empty_answer`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Intent not recognized. Add more templates.")]
    UnrecognizedIntent,
    #[error("Entity not found for '{mention}'")]
    EntityNotFound {
        mention: String,
        candidates: Vec<Candidate>,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ResolveError {
    pub fn candidates(&self) -> Option<&[Candidate]> {
        match self {
            ResolveError::EntityNotFound { candidates, .. } => Some(candidates),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier `{0}` (expected an item id like Q42)")]
pub struct IdentifierError(pub String);
