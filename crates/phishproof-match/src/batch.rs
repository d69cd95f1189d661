//! Batch domain checks over a bounded worker pool.
//!
//! Workers hold the store lock only while fetching candidates; scoring
//! runs outside it. Results are correlated back to their input index,
//! so the output order always matches the input order even though
//! execution is unordered.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use phishproof_analysis::extract_features;
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::{engine, MatchConfig, MatchError};
use phishproof_types::MatchVerdict;

/// One slot of a batch response. A failing domain occupies its slot
/// with an error instead of aborting the batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub domain: String,
    pub result: Result<MatchVerdict, MatchError>,
}

/// Check many domains, preserving input order in the output.
pub async fn check_domains_batch(
    db: Arc<Mutex<Connection>>,
    cfg: Arc<MatchConfig>,
    domains: Vec<String>,
) -> Vec<BatchOutcome> {
    let workers = effective_workers(&cfg, domains.len());
    tracing::debug!(batch = domains.len(), workers, "starting batch check");

    let mut indexed: Vec<(usize, BatchOutcome)> = stream::iter(domains.into_iter().enumerate())
        .map(|(index, domain)| {
            let db = Arc::clone(&db);
            let cfg = Arc::clone(&cfg);
            async move {
                let result = check_one(&db, &cfg, &domain).await;
                (index, BatchOutcome { domain, result })
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await;

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

async fn check_one(
    db: &Mutex<Connection>,
    cfg: &MatchConfig,
    domain: &str,
) -> Result<MatchVerdict, MatchError> {
    let features = extract_features(domain, 0)?;
    let context = {
        let conn = db.lock().await;
        engine::fetch_context(&conn, &features, cfg)?
    };
    Ok(engine::resolve_verdict(&features, &context, cfg))
}

/// Worker-pool size for a batch: the configured pool when parallelism
/// is enabled and the batch is large enough to benefit, otherwise 1.
fn effective_workers(cfg: &MatchConfig, batch_len: usize) -> usize {
    if cfg.parallel.enabled && batch_len > cfg.parallel.batch_threshold {
        cfg.parallel.max_workers.max(1)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParallelConfig;
    use phishproof_db::queries::{domains, lists};

    fn seeded_db(corpus: &[&str]) -> Arc<Mutex<Connection>> {
        let conn = phishproof_db::open_memory().expect("open");
        lists::create(&conn, "L1", 1000, 1).expect("create list");
        let features: Vec<_> = corpus
            .iter()
            .enumerate()
            .map(|(i, d)| extract_features(d, i as u64 + 1).expect("extract"))
            .collect();
        domains::insert_batch(&conn, "L1", &features).expect("insert");
        lists::mark_processed(&conn, "L1", corpus.len() as u64).expect("mark");
        lists::activate(&conn, "L1").expect("activate");
        Arc::new(Mutex::new(conn))
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order_and_isolates_failures() {
        let db = seeded_db(&["a.com", "b.com"]);
        let cfg = Arc::new(MatchConfig::default());

        let outcomes = check_domains_batch(
            db,
            cfg,
            vec![
                "a.com".to_string(),
                "not a domain".to_string(),
                "b.com".to_string(),
            ],
        )
        .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].domain, "a.com");
        assert_eq!(outcomes[1].domain, "not a domain");
        assert_eq!(outcomes[2].domain, "b.com");

        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(MatchError::InvalidDomain(_))
        ));
        let last = outcomes[2].result.as_ref().expect("b.com checks");
        assert_eq!(last.matched_domain.as_deref(), Some("b.com"));
    }

    #[tokio::test]
    async fn test_parallel_batch_matches_sequential_results() {
        let db = seeded_db(&["google.com", "amazon.com", "paypal.com"]);
        let queries: Vec<String> = (0..40)
            .map(|i| {
                if i % 2 == 0 {
                    "g00gle.com".to_string()
                } else {
                    "paypa1.com".to_string()
                }
            })
            .collect();

        let parallel_cfg = Arc::new(MatchConfig {
            parallel: ParallelConfig {
                enabled: true,
                max_workers: 4,
                batch_threshold: 8,
            },
            ..MatchConfig::default()
        });
        let sequential_cfg = Arc::new(MatchConfig {
            parallel: ParallelConfig {
                enabled: false,
                max_workers: 4,
                batch_threshold: 8,
            },
            ..MatchConfig::default()
        });

        let parallel = check_domains_batch(Arc::clone(&db), parallel_cfg, queries.clone()).await;
        let sequential = check_domains_batch(db, sequential_cfg, queries).await;

        assert_eq!(parallel.len(), sequential.len());
        for (p, s) in parallel.iter().zip(&sequential) {
            assert_eq!(p.domain, s.domain);
            let pv = p.result.as_ref().expect("verdict");
            let sv = s.result.as_ref().expect("verdict");
            assert_eq!(pv, sv);
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let db = seeded_db(&["google.com"]);
        let outcomes = check_domains_batch(db, Arc::new(MatchConfig::default()), vec![]).await;
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_effective_workers_policy() {
        let mut cfg = MatchConfig::default();
        cfg.parallel = ParallelConfig {
            enabled: true,
            max_workers: 8,
            batch_threshold: 16,
        };
        assert_eq!(effective_workers(&cfg, 10), 1, "small batch stays sequential");
        assert_eq!(effective_workers(&cfg, 17), 8);

        cfg.parallel.enabled = false;
        assert_eq!(effective_workers(&cfg, 1000), 1, "disabled pool has size 1");

        cfg.parallel.enabled = true;
        cfg.parallel.max_workers = 0;
        assert_eq!(effective_workers(&cfg, 1000), 1, "pool never drops below 1");
    }
}
