//! Canonical domain feature records shared by the ingestion and query
//! paths.

use serde::{Deserialize, Serialize};

/// Phonetic fingerprints of an owner label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneticCodes {
    /// Four-character Soundex code.
    pub soundex: String,
    /// Classic single-code Metaphone.
    pub metaphone: String,
    /// Double-Metaphone primary code.
    pub double_metaphone: String,
}

/// Features extracted from a raw domain string.
///
/// Extraction is a pure function of its input: the same raw string
/// always yields byte-identical features. Length, first character, and
/// phonetic codes are computed over the owner label only, because that
/// is the portion a squatter can vary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainFeatures {
    /// The domain exactly as supplied by the caller.
    pub original_domain: String,
    /// Normalized registrant-controlled label directly above the
    /// registry suffix ("google" in "www.google.co.uk").
    pub owner_label: String,
    /// Public registry suffix ("com", "co.uk").
    pub registry_suffix: String,
    /// Length of the owner label.
    pub owner_length: usize,
    /// First character of the owner label.
    pub first_char: char,
    /// Phonetic fingerprints of the owner label.
    pub phonetic: PhoneticCodes,
    /// Rank carried by the source list; 0 on the query path.
    pub source_rank: u64,
}

/// A trusted domain as persisted in the store.
///
/// Records are bulk-created while a list is processed, never mutated,
/// and deleted only when their owning list is purged or replaced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedDomainRecord {
    pub record_id: String,
    pub list_id: String,
    pub features: DomainFeatures,
}
