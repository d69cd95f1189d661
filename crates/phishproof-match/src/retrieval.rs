//! Candidate retrieval.

use phishproof_db::{queries, Result};
use phishproof_types::{DomainFeatures, TrustedDomainRecord};
use rusqlite::Connection;

/// Fetch the candidate window for one query from the active list.
///
/// The window is symmetric around the query's owner-label length
/// (`± threshold`) and keeps the query's first character and registry
/// suffix. A squat formed by a leading-character edit or a prefix
/// insertion lands outside this bucket; that recall loss is a known
/// cost of keeping candidate sets small and is tunable only through
/// the threshold.
pub fn candidate_window(
    conn: &Connection,
    features: &DomainFeatures,
    threshold: usize,
) -> Result<Vec<TrustedDomainRecord>> {
    let length_low = features.owner_length.saturating_sub(threshold);
    let length_high = features.owner_length + threshold;
    let candidates = queries::domains::candidates_for_squat_check(
        conn,
        length_low,
        length_high,
        features.first_char,
        &features.registry_suffix,
    )?;
    tracing::debug!(
        query = features.owner_label,
        count = candidates.len(),
        "fetched candidate window"
    );
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phishproof_analysis::extract_features;
    use phishproof_db::queries::lists;

    fn seeded_db(owners: &[&str]) -> Connection {
        let conn = phishproof_db::open_memory().expect("open");
        lists::create(&conn, "L1", 1000, 1).expect("create list");
        let features: Vec<_> = owners
            .iter()
            .enumerate()
            .map(|(i, owner)| {
                extract_features(&format!("{owner}.com"), i as u64 + 1).expect("extract")
            })
            .collect();
        queries::domains::insert_batch(&conn, "L1", &features).expect("insert");
        lists::mark_processed(&conn, "L1", owners.len() as u64).expect("mark");
        lists::activate(&conn, "L1").expect("activate");
        conn
    }

    #[test]
    fn test_window_spans_threshold() {
        let conn = seeded_db(&["google", "goo", "googleplex"]);
        let query = extract_features("g00gle.com", 0).expect("extract");

        let hits = candidate_window(&conn, &query, 2).expect("window");
        let owners: Vec<_> = hits
            .iter()
            .map(|r| r.features.owner_label.as_str())
            .collect();
        // length 6 ± 2 keeps "google" (6) but not "goo" (3) or
        // "googleplex" (10).
        assert_eq!(owners, vec!["google"]);
    }

    #[test]
    fn test_leading_edit_misses_bucket() {
        let conn = seeded_db(&["google"]);
        let query = extract_features("foogle.com", 0).expect("extract");
        let hits = candidate_window(&conn, &query, 2).expect("window");
        assert!(hits.is_empty(), "first-character bucketing excludes leading edits");
    }
}
