//! Query orchestration around the matching engine.
//!
//! Repeat checks for the same (domain, requester) pair are O(1) state
//! lookups: while a live state exists, its cached decision is returned
//! and the matching engine is never invoked.

use std::sync::Arc;

use phishproof_analysis::extract_features;
use phishproof_match::{engine, MatchConfig, MatchError};
use phishproof_types::{DecisionState, MatchVerdict};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::manager::StateManager;
use crate::StateError;

/// How a verdict maps to an access decision.
///
/// The two policies mirror the two behaviors observed in production:
/// one service denied only when the edit-distance and phonetic signals
/// agreed, the other denied on edit distance alone. Neither is
/// obviously right, so the choice is configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyPolicy {
    /// Deny only when both the edit-distance and phonetic signals
    /// flag the domain.
    #[serde(rename = "require-both")]
    RequireBothSignals,
    /// Deny on any typosquat verdict.
    #[serde(rename = "edit-distance")]
    EditDistanceAlone,
}

impl Default for DenyPolicy {
    fn default() -> Self {
        Self::RequireBothSignals
    }
}

impl DenyPolicy {
    /// Access decision for a verdict under this policy.
    pub fn access_allowed(self, verdict: &MatchVerdict) -> bool {
        match self {
            Self::RequireBothSignals => !(verdict.is_typosquat && verdict.phonetic_match),
            Self::EditDistanceAlone => !verdict.is_typosquat,
        }
    }
}

/// Outcome of a stateful domain evaluation.
#[derive(Clone, Debug)]
pub struct DomainDecision {
    pub state: DecisionState,
    /// `None` when the decision came from an existing state and the
    /// matching engine was not consulted.
    pub verdict: Option<MatchVerdict>,
}

/// Evaluation failures.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Stateful domain evaluation: cached decision first, fresh verdict
/// otherwise.
pub struct DecisionEngine {
    states: StateManager,
    match_cfg: Arc<MatchConfig>,
    policy: DenyPolicy,
}

impl DecisionEngine {
    pub fn new(states: StateManager, match_cfg: Arc<MatchConfig>, policy: DenyPolicy) -> Self {
        Self {
            states,
            match_cfg,
            policy,
        }
    }

    /// Evaluate a domain for a requester.
    ///
    /// A live state for the pair short-circuits the matching engine.
    /// Otherwise the engine runs, the configured policy derives the
    /// access decision, and a new overridable state is persisted.
    pub async fn evaluate_domain(
        &self,
        db: &Mutex<Connection>,
        domain: &str,
        ip_address: Option<&str>,
    ) -> Result<DomainDecision, DecisionError> {
        {
            let conn = db.lock().await;
            if let Some(state) = self.states.find_live_state(&conn, domain, ip_address)? {
                tracing::debug!(
                    state_id = state.state_id,
                    domain,
                    "reusing cached access decision"
                );
                return Ok(DomainDecision {
                    state,
                    verdict: None,
                });
            }
        }

        let features = extract_features(domain, 0).map_err(MatchError::from)?;
        let context = {
            let conn = db.lock().await;
            engine::fetch_context(&conn, &features, &self.match_cfg)?
        };
        let verdict = engine::resolve_verdict(&features, &context, &self.match_cfg);
        let access_allowed = self.policy.access_allowed(&verdict);

        let conn = db.lock().await;
        let state = self
            .states
            .create_state(&conn, domain, ip_address, true, access_allowed)?;
        Ok(DomainDecision {
            state,
            verdict: Some(verdict),
        })
    }

    /// The state manager backing this engine.
    pub fn states(&self) -> &StateManager {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use phishproof_db::queries::{domains, lists};
    use phishproof_types::MatchVerdict;
    use rusqlite::Connection;

    fn seeded_db(corpus: &[&str]) -> Mutex<Connection> {
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
        Mutex::new(conn)
    }

    fn engine_with(policy: DenyPolicy) -> DecisionEngine {
        DecisionEngine::new(
            StateManager::new(Duration::from_secs(3600)),
            Arc::new(MatchConfig::default()),
            policy,
        )
    }

    fn squat_verdict(phonetic: bool) -> MatchVerdict {
        MatchVerdict {
            query_domain: "g00gle.com".to_string(),
            is_typosquat: true,
            matched_domain: Some("google.com".to_string()),
            edit_distance: Some(2),
            phonetic_match: phonetic,
            phonetic_match_type: None,
        }
    }

    #[test]
    fn test_deny_policies() {
        let both = DenyPolicy::RequireBothSignals;
        let edit = DenyPolicy::EditDistanceAlone;

        let clean = MatchVerdict::clean("fine.com");
        assert!(both.access_allowed(&clean));
        assert!(edit.access_allowed(&clean));

        // Edit-distance hit without phonetic corroboration.
        assert!(both.access_allowed(&squat_verdict(false)));
        assert!(!edit.access_allowed(&squat_verdict(false)));

        // Both signals agree.
        assert!(!both.access_allowed(&squat_verdict(true)));
        assert!(!edit.access_allowed(&squat_verdict(true)));
    }

    #[tokio::test]
    async fn test_first_evaluation_persists_state() {
        let db = seeded_db(&["google.com"]);
        let engine = engine_with(DenyPolicy::RequireBothSignals);

        let decision = engine
            .evaluate_domain(&db, "googel.com", Some("10.0.0.1"))
            .await
            .expect("evaluate");

        let verdict = decision.verdict.expect("fresh verdict");
        assert!(verdict.is_typosquat);
        assert!(verdict.phonetic_match, "googel sounds like google");
        assert!(!decision.state.access_allowed, "both signals deny");
        assert!(!decision.state.override_locked);
    }

    #[tokio::test]
    async fn test_repeat_evaluation_reuses_state() {
        let db = seeded_db(&["google.com"]);
        let engine = engine_with(DenyPolicy::RequireBothSignals);

        let first = engine
            .evaluate_domain(&db, "googel.com", Some("10.0.0.1"))
            .await
            .expect("first");
        let second = engine
            .evaluate_domain(&db, "googel.com", Some("10.0.0.1"))
            .await
            .expect("second");

        assert_eq!(second.state.state_id, first.state.state_id);
        assert!(second.verdict.is_none(), "matching engine skipped");

        // A different requester gets its own state.
        let other = engine
            .evaluate_domain(&db, "googel.com", Some("10.0.0.2"))
            .await
            .expect("other requester");
        assert_ne!(other.state.state_id, first.state.state_id);
        assert!(other.verdict.is_some());
    }

    #[tokio::test]
    async fn test_edit_only_squat_still_denied_under_strict_policy() {
        // "g00gle" is 2 edits from "google" but shares no phonetic
        // code ("00" breaks Soundex); the strict policy denies anyway.
        let db = seeded_db(&["google.com"]);
        let engine = engine_with(DenyPolicy::EditDistanceAlone);

        let decision = engine
            .evaluate_domain(&db, "g00gle.com", None)
            .await
            .expect("evaluate");
        let verdict = decision.verdict.expect("fresh verdict");
        assert!(verdict.is_typosquat);
        assert!(!decision.state.access_allowed);
    }

    #[tokio::test]
    async fn test_clean_domain_is_allowed_and_cached() {
        let db = seeded_db(&["google.com"]);
        let engine = engine_with(DenyPolicy::RequireBothSignals);

        let decision = engine
            .evaluate_domain(&db, "zzyzx.com", None)
            .await
            .expect("evaluate");
        assert!(decision.state.access_allowed);

        let cached = engine
            .evaluate_domain(&db, "zzyzx.com", None)
            .await
            .expect("cached");
        assert!(cached.verdict.is_none());
        assert!(cached.state.access_allowed);
    }

    #[tokio::test]
    async fn test_invalid_domain_surfaces_as_match_error() {
        let db = seeded_db(&["google.com"]);
        let engine = engine_with(DenyPolicy::RequireBothSignals);

        let err = engine
            .evaluate_domain(&db, "not a domain", None)
            .await
            .expect_err("invalid");
        assert!(matches!(
            err,
            DecisionError::Match(MatchError::InvalidDomain(_))
        ));
    }
}

