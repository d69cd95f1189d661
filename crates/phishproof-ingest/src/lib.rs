//! # phishproof-ingest
//!
//! Keeps the trusted-domain corpus fresh: fetches daily list metadata
//! from the ranking provider, stores the raw CSV in the object store,
//! loads it through the feature extractor into the database, and flips
//! the processed list active.

pub mod object_store;
pub mod pipeline;
pub mod provider;
pub mod retry;

use phishproof_db::DbError;

pub use object_store::{FsObjectStore, ObjectStore};
pub use pipeline::{IngestPipeline, PipelineConfig, ProcessedList};
pub use provider::{DailyListMetadata, HttpListProvider, ListProvider, ProviderError};
pub use retry::RetryPolicy;

/// Ingestion failures.
///
/// None of these ever touch the currently active list: activation only
/// happens after a fully successful processing pass.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("object store failure: {0}")]
    ObjectStore(#[from] std::io::Error),

    /// A row without exactly two fields means the source format
    /// changed; the whole cycle aborts rather than loading garbage.
    #[error("malformed list record at line {line}: {content:?}")]
    MalformedRecord { line: u64, content: String },

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{what} still failing after {attempts} attempts")]
    RetriesExhausted { what: &'static str, attempts: u32 },
}
