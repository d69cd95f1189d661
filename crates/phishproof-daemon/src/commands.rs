//! RPC command handlers.
//!
//! Thin shims: parameter parsing and error mapping only. All real work
//! happens in the matching, state, and db crates.

use serde::Deserialize;
use serde_json::{json, Value};

use phishproof_db::queries;
use phishproof_match::{self as matching, MatchError};
use phishproof_state::{DecisionError, StateError};

use crate::rpc::RpcError;
use crate::DaemonState;

#[derive(Deserialize)]
struct DomainParams {
    domain: String,
    #[serde(default)]
    ip_address: Option<String>,
}

#[derive(Deserialize)]
struct BatchParams {
    domains: Vec<String>,
}

#[derive(Deserialize)]
struct StateIdParams {
    state_id: String,
}

#[derive(Deserialize)]
struct OverrideParams {
    state_id: String,
    access_allowed: bool,
}

fn parse<T: serde::de::DeserializeOwned>(params: &Value) -> Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

fn map_match_error(domain: &str, error: MatchError) -> RpcError {
    match error {
        MatchError::InvalidDomain(_) => RpcError::invalid_domain(domain),
        MatchError::Db(e) => RpcError::internal_error(&e.to_string()),
    }
}

/// Stateless single-domain check.
pub async fn check_domain(state: &DaemonState, params: &Value) -> Result<Value, RpcError> {
    let p: DomainParams = parse(params)?;
    let conn = state.db.lock().await;
    let verdict = matching::check_domain(&conn, &state.match_cfg, &p.domain)
        .map_err(|e| map_match_error(&p.domain, e))?;
    serde_json::to_value(verdict).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Batch check; one result slot per input domain, input order kept.
pub async fn check_domains_batch(state: &DaemonState, params: &Value) -> Result<Value, RpcError> {
    let p: BatchParams = parse(params)?;
    let outcomes = matching::check_domains_batch(
        state.db.clone(),
        state.match_cfg.clone(),
        p.domains,
    )
    .await;

    let results: Vec<Value> = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(verdict) => json!({"domain": outcome.domain, "verdict": verdict}),
            Err(error) => json!({
                "domain": outcome.domain,
                "error": map_match_error(&outcome.domain, error),
            }),
        })
        .collect();
    Ok(Value::Array(results))
}

/// Stateful evaluation: cached decision or fresh verdict plus a new
/// decision state.
pub async fn evaluate_domain(state: &DaemonState, params: &Value) -> Result<Value, RpcError> {
    let p: DomainParams = parse(params)?;
    let decision = state
        .decisions
        .evaluate_domain(&state.db, &p.domain, p.ip_address.as_deref())
        .await
        .map_err(|e| match e {
            DecisionError::Match(m) => map_match_error(&p.domain, m),
            DecisionError::State(s) => RpcError::internal_error(&s.to_string()),
        })?;

    let from_cache = decision.verdict.is_none();
    Ok(json!({
        "state": decision.state,
        "verdict": decision.verdict,
        "from_cache": from_cache,
    }))
}

/// Look up a decision state.
pub async fn get_state(state: &DaemonState, params: &Value) -> Result<Value, RpcError> {
    let p: StateIdParams = parse(params)?;
    let conn = state.db.lock().await;
    let found = state
        .states
        .get_state(&conn, &p.state_id)
        .map_err(|e| RpcError::internal_error(&e.to_string()))?
        .ok_or_else(|| RpcError::state_not_found(&p.state_id))?;
    serde_json::to_value(found).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Apply an access override to a live, unlocked state.
pub async fn override_state(state: &DaemonState, params: &Value) -> Result<Value, RpcError> {
    let p: OverrideParams = parse(params)?;
    let conn = state.db.lock().await;
    let updated = state
        .states
        .override_state(&conn, &p.state_id, p.access_allowed)
        .map_err(|e| match e {
            StateError::StateNotFound(_) => RpcError::state_not_found(&p.state_id),
            StateError::Db(db) => RpcError::internal_error(&db.to_string()),
        })?;
    serde_json::to_value(updated).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Drop a decision state ahead of its TTL.
pub async fn delete_state(state: &DaemonState, params: &Value) -> Result<Value, RpcError> {
    let p: StateIdParams = parse(params)?;
    let conn = state.db.lock().await;
    let deleted = state
        .states
        .delete_state(&conn, &p.state_id)
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;
    Ok(json!({"deleted": deleted}))
}

/// Administrative purge of every trusted-domain record.
pub async fn purge_trusted_domains(state: &DaemonState) -> Result<Value, RpcError> {
    let conn = state.db.lock().await;
    let purged = queries::domains::purge_all(&conn)
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;
    Ok(json!({"purged": purged}))
}
