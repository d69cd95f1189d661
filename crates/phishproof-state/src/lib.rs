//! # phishproof-state
//!
//! The ephemeral decision layer: TTL-scoped access states keyed by
//! opaque identifiers, and the query orchestration that reuses a
//! cached verdict instead of re-running the matching engine.

pub mod decision;
pub mod manager;
pub mod ttl;

use phishproof_db::DbError;

pub use decision::{DecisionEngine, DecisionError, DenyPolicy, DomainDecision};
pub use manager::StateManager;
pub use ttl::{parse_ttl, TtlParseError};

/// State-layer failures.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Covers missing, expired, and override-locked states uniformly,
    /// so callers cannot probe a state's override status.
    #[error("state not found: {0}")]
    StateNotFound(String),

    #[error(transparent)]
    Db(#[from] DbError),
}
