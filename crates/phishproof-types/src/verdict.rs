//! Match verdicts produced by the detection engine.

use serde::{Deserialize, Serialize};

/// Which phonetic algorithm produced a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneticAlgorithm {
    Soundex,
    Metaphone,
    DoubleMetaphone,
}

/// Outcome of checking one domain against the trusted corpus.
///
/// Immutable once produced. An edit-distance match always carries
/// `matched_domain` and `edit_distance`; a phonetic-only match carries
/// neither, only the `phonetic_match` flag and the algorithm that hit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchVerdict {
    pub query_domain: String,
    pub is_typosquat: bool,
    pub matched_domain: Option<String>,
    pub edit_distance: Option<usize>,
    pub phonetic_match: bool,
    pub phonetic_match_type: Option<PhoneticAlgorithm>,
}

impl MatchVerdict {
    /// Verdict for a domain that matched nothing.
    pub fn clean(query_domain: impl Into<String>) -> Self {
        Self {
            query_domain: query_domain.into(),
            is_typosquat: false,
            matched_domain: None,
            edit_distance: None,
            phonetic_match: false,
            phonetic_match_type: None,
        }
    }

    /// Verdict for an exact corpus hit. Exact matches are safe by
    /// definition and never flagged.
    pub fn exact(query_domain: impl Into<String>, matched_domain: impl Into<String>) -> Self {
        Self {
            query_domain: query_domain.into(),
            is_typosquat: false,
            matched_domain: Some(matched_domain.into()),
            edit_distance: Some(0),
            phonetic_match: false,
            phonetic_match_type: None,
        }
    }
}
