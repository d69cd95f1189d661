//! Lifecycle metadata for downloaded ranked-domain lists.

use serde::{Deserialize, Serialize};

/// Metadata for one downloaded list.
///
/// A list moves through download → processing → active, and ends
/// purged. At most one list is `active` at any time; the activation
/// update enforces this transactionally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMetadata {
    pub list_id: String,
    /// Unix epoch seconds at download time.
    pub downloaded_at: u64,
    /// Size of the stored CSV object.
    pub size_bytes: u64,
    /// Number of rows loaded; 0 until processing completes.
    pub record_count: u64,
    /// All rows for this list are in the store.
    pub processed: bool,
    /// This list serves matching queries.
    pub active: bool,
    /// Superseded; its domain rows have been removed.
    pub purged: bool,
}
