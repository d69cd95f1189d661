//! Domain normalization and feature extraction.
//!
//! The owner label (the registrant-controlled label directly above the
//! public registry suffix) is the squattable portion of a domain, so
//! length, first character, and phonetic codes are computed over it
//! rather than over the full host name. Registry suffixes come from
//! the maintained Public Suffix List, never from local heuristics.

use phishproof_types::{DomainFeatures, PhoneticCodes};
use thiserror::Error;

use crate::phonetic;

/// Raised when a raw string cannot be reduced to an owner label under
/// a known registry suffix. Recoverable: callers decide whether to
/// reject the request or treat it as "no match".
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("invalid domain: {0:?}")]
    InvalidDomain(String),
}

/// Lowercase, trim, and convert internationalized labels to their
/// ASCII-compatible encoding.
pub fn normalize(raw: &str) -> Result<String, FeatureError> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(FeatureError::InvalidDomain(raw.to_string()));
    }
    idna::domain_to_ascii(&trimmed).map_err(|e| {
        tracing::debug!(domain = raw, error = %e, "domain failed IDN conversion");
        FeatureError::InvalidDomain(raw.to_string())
    })
}

/// Extract canonical features from a raw domain string.
///
/// `source_rank` is the rank carried by the ranked list on the
/// ingestion path; query-path callers pass 0. Two extractions of the
/// same raw string yield byte-identical features.
///
/// Fails with [`FeatureError::InvalidDomain`] when the input is empty,
/// not IDN-encodable, a bare registry suffix, or under no known
/// suffix.
pub fn extract_features(raw: &str, source_rank: u64) -> Result<DomainFeatures, FeatureError> {
    let invalid = || FeatureError::InvalidDomain(raw.to_string());

    let normalized = normalize(raw)?;
    let registrable = psl::domain(normalized.as_bytes()).ok_or_else(invalid)?;
    let registry_suffix = std::str::from_utf8(registrable.suffix().as_bytes())
        .map_err(|_| invalid())?
        .to_string();
    let registrable = std::str::from_utf8(registrable.as_bytes()).map_err(|_| invalid())?;

    // "google.co.uk" with suffix "co.uk" leaves the owner label
    // "google"; a bare suffix has no owner label and is rejected.
    let owner_label = registrable
        .strip_suffix(registry_suffix.as_str())
        .and_then(|s| s.strip_suffix('.'))
        .filter(|s| !s.is_empty())
        .ok_or_else(invalid)?
        .to_string();
    let first_char = owner_label.chars().next().ok_or_else(invalid)?;

    Ok(DomainFeatures {
        original_domain: raw.to_string(),
        owner_length: owner_label.chars().count(),
        first_char,
        phonetic: PhoneticCodes {
            soundex: phonetic::soundex(&owner_label),
            metaphone: phonetic::metaphone(&owner_label),
            double_metaphone: phonetic::double_metaphone(&owner_label),
        },
        owner_label,
        registry_suffix,
        source_rank,
    })
}
