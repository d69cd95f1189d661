//! # phishproof-match
//!
//! The matching engine: candidate retrieval from the trusted-domain
//! store, edit-distance and phonetic scoring, and bounded-concurrency
//! batch orchestration.

pub mod batch;
pub mod engine;
pub mod retrieval;

use phishproof_analysis::FeatureError;
use phishproof_db::DbError;
use serde::{Deserialize, Serialize};

pub use batch::{check_domains_batch, BatchOutcome};
pub use engine::check_domain;

/// Per-algorithm phonetic matching toggles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhoneticToggles {
    pub enabled: bool,
    pub soundex: bool,
    pub metaphone: bool,
    pub double_metaphone: bool,
}

impl Default for PhoneticToggles {
    fn default() -> Self {
        Self {
            enabled: true,
            soundex: true,
            metaphone: true,
            double_metaphone: true,
        }
    }
}

/// Batch execution limits.
///
/// There is a single execution path: when parallelism is disabled, or
/// a batch is below the threshold, the worker pool simply has size 1.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParallelConfig {
    pub enabled: bool,
    pub max_workers: usize,
    /// Batches at or below this size run sequentially.
    pub batch_threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_workers: 8,
            batch_threshold: 16,
        }
    }
}

/// Matching-engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    pub edit_distance_threshold: usize,
    pub phonetic: PhoneticToggles,
    pub parallel: ParallelConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            edit_distance_threshold: 2,
            phonetic: PhoneticToggles::default(),
            parallel: ParallelConfig::default(),
        }
    }
}

/// Matching-path failures.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(transparent)]
    InvalidDomain(#[from] FeatureError),

    #[error("store error: {0}")]
    Db(#[from] DbError),
}
