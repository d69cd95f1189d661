//! # phishproof-analysis
//!
//! Pure analysis primitives for the detection engine: domain
//! normalization and feature extraction, phonetic fingerprints, and
//! bounded edit distance. No I/O; every function is deterministic.

pub mod edit_distance;
pub mod features;
pub mod phonetic;

pub use edit_distance::bounded_levenshtein;
pub use features::{extract_features, normalize, FeatureError};
