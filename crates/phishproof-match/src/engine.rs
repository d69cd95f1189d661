//! Verdict resolution for single-domain checks.

use phishproof_analysis::{bounded_levenshtein, extract_features};
use phishproof_db::queries;
use phishproof_types::{DomainFeatures, MatchVerdict, PhoneticAlgorithm, TrustedDomainRecord};
use rusqlite::Connection;

use crate::{retrieval, MatchConfig, MatchError, PhoneticToggles};

/// Store reads needed to resolve one query, fetched in one pass so
/// scoring can run without touching the connection.
#[derive(Debug)]
pub struct MatchContext {
    exact: Option<TrustedDomainRecord>,
    candidates: Vec<TrustedDomainRecord>,
}

/// Fetch the exact-match record and, failing that, the candidate
/// window.
pub fn fetch_context(
    conn: &Connection,
    features: &DomainFeatures,
    cfg: &MatchConfig,
) -> Result<MatchContext, MatchError> {
    let exact = queries::domains::exact_match(conn, &features.owner_label, &features.registry_suffix)?;
    let candidates = if exact.is_some() {
        Vec::new()
    } else {
        retrieval::candidate_window(conn, features, cfg.edit_distance_threshold)?
    };
    Ok(MatchContext { exact, candidates })
}

/// Score the fetched context into a verdict. Pure; no store access.
pub fn resolve_verdict(
    features: &DomainFeatures,
    context: &MatchContext,
    cfg: &MatchConfig,
) -> MatchVerdict {
    let query_domain = features.original_domain.as_str();

    if let Some(exact) = &context.exact {
        tracing::debug!(domain = query_domain, "exact corpus match");
        return MatchVerdict::exact(query_domain, exact.features.original_domain.clone());
    }

    let mut best: Option<(&TrustedDomainRecord, usize)> = None;
    let mut phonetic_hit: Option<PhoneticAlgorithm> = None;

    for candidate in &context.candidates {
        let distance = bounded_levenshtein(
            &features.owner_label,
            &candidate.features.owner_label,
            cfg.edit_distance_threshold,
        );
        if distance <= cfg.edit_distance_threshold
            && best.map_or(true, |(_, min)| distance < min)
        {
            best = Some((candidate, distance));
        }

        if cfg.phonetic.enabled && phonetic_hit.is_none() {
            phonetic_hit = phonetic_match(features, candidate, &cfg.phonetic);
        }
    }

    // An edit-distance match always outranks a phonetic-only match;
    // the phonetic result survives as an annotation.
    match (best, phonetic_hit) {
        (Some((record, distance)), phonetic) => {
            tracing::info!(
                domain = query_domain,
                matched = record.features.original_domain,
                distance,
                "typosquat detected by edit distance"
            );
            MatchVerdict {
                query_domain: query_domain.to_string(),
                is_typosquat: true,
                matched_domain: Some(record.features.original_domain.clone()),
                edit_distance: Some(distance),
                phonetic_match: phonetic.is_some(),
                phonetic_match_type: phonetic,
            }
        }
        (None, Some(algorithm)) => {
            tracing::info!(
                domain = query_domain,
                ?algorithm,
                "typosquat detected by phonetic similarity only"
            );
            MatchVerdict {
                query_domain: query_domain.to_string(),
                is_typosquat: true,
                matched_domain: None,
                edit_distance: None,
                phonetic_match: true,
                phonetic_match_type: Some(algorithm),
            }
        }
        (None, None) => MatchVerdict::clean(query_domain),
    }
}

/// First phonetic algorithm that agrees, in fixed priority order.
/// Empty codes are never evidence of similarity.
fn phonetic_match(
    query: &DomainFeatures,
    candidate: &TrustedDomainRecord,
    toggles: &PhoneticToggles,
) -> Option<PhoneticAlgorithm> {
    let q = &query.phonetic;
    let c = &candidate.features.phonetic;
    if toggles.soundex && !q.soundex.is_empty() && q.soundex == c.soundex {
        return Some(PhoneticAlgorithm::Soundex);
    }
    if toggles.metaphone && !q.metaphone.is_empty() && q.metaphone == c.metaphone {
        return Some(PhoneticAlgorithm::Metaphone);
    }
    if toggles.double_metaphone
        && !q.double_metaphone.is_empty()
        && q.double_metaphone == c.double_metaphone
    {
        return Some(PhoneticAlgorithm::DoubleMetaphone);
    }
    None
}

/// Check a single domain against the trusted corpus.
///
/// Fails with [`MatchError::InvalidDomain`] when the query cannot be
/// reduced to features; callers choose between rejecting the request
/// and treating it as "no match".
pub fn check_domain(
    conn: &Connection,
    cfg: &MatchConfig,
    domain: &str,
) -> Result<MatchVerdict, MatchError> {
    let features = extract_features(domain, 0)?;
    let context = fetch_context(conn, &features, cfg)?;
    Ok(resolve_verdict(&features, &context, cfg))
}
