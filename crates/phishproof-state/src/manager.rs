//! Decision-state lifecycle.

use std::time::Duration;

use phishproof_db::queries::states;
use phishproof_types::{unix_now, DecisionState};
use rusqlite::Connection;
use uuid::Uuid;

use crate::StateError;

/// Creates, reads, overrides, and sweeps TTL-scoped decision states.
#[derive(Clone, Debug)]
pub struct StateManager {
    ttl: Duration,
}

impl StateManager {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Create and persist a state for a (domain, requester) pair.
    ///
    /// The identifier is an opaque UUID. `override_available` controls
    /// whether a later explicit override is possible; when false the
    /// state is born locked.
    pub fn create_state(
        &self,
        conn: &Connection,
        domain_name: &str,
        ip_address: Option<&str>,
        override_available: bool,
        access_allowed: bool,
    ) -> Result<DecisionState, StateError> {
        let now = unix_now();
        let state = DecisionState {
            state_id: Uuid::new_v4().to_string(),
            domain_name: domain_name.to_string(),
            ip_address: ip_address.map(str::to_string),
            created_at: now,
            expires_at: now + self.ttl.as_secs(),
            access_allowed,
            override_locked: !override_available,
        };
        states::insert(conn, &state)?;
        tracing::info!(
            state_id = state.state_id,
            domain = domain_name,
            access_allowed,
            "created decision state"
        );
        Ok(state)
    }

    /// Fetch a state by identifier.
    pub fn get_state(
        &self,
        conn: &Connection,
        state_id: &str,
    ) -> Result<Option<DecisionState>, StateError> {
        Ok(states::get(conn, state_id)?)
    }

    /// The live state for a (domain, requester) pair, if any.
    pub fn find_live_state(
        &self,
        conn: &Connection,
        domain_name: &str,
        ip_address: Option<&str>,
    ) -> Result<Option<DecisionState>, StateError> {
        Ok(states::find_live_for_requester(
            conn,
            domain_name,
            ip_address,
            unix_now(),
        )?)
    }

    /// Apply an explicit access override.
    ///
    /// Succeeds only for a live, never-overridden state; the override
    /// refreshes the TTL and locks the state. Missing, expired, and
    /// locked states all fail with [`StateError::StateNotFound`].
    pub fn override_state(
        &self,
        conn: &Connection,
        state_id: &str,
        access_allowed: bool,
    ) -> Result<DecisionState, StateError> {
        let now = unix_now();
        let changed = states::override_access(
            conn,
            state_id,
            access_allowed,
            now,
            now + self.ttl.as_secs(),
        )?;
        if changed == 0 {
            return Err(StateError::StateNotFound(state_id.to_string()));
        }
        tracing::info!(state_id, access_allowed, "state overridden and locked");
        states::get(conn, state_id)?
            .ok_or_else(|| StateError::StateNotFound(state_id.to_string()))
    }

    /// Delete every expired state. Returns the number removed.
    pub fn sweep_expired(&self, conn: &Connection) -> Result<usize, StateError> {
        let removed = states::delete_expired(conn, unix_now())?;
        if removed > 0 {
            tracing::info!(removed, "swept expired decision states");
        }
        Ok(removed)
    }

    /// Delete one state regardless of its lifecycle position.
    pub fn delete_state(&self, conn: &Connection, state_id: &str) -> Result<bool, StateError> {
        Ok(states::delete(conn, state_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        phishproof_db::open_memory().expect("open test db")
    }

    fn manager(ttl_secs: u64) -> StateManager {
        StateManager::new(Duration::from_secs(ttl_secs))
    }

    #[test]
    fn test_create_and_get() {
        let conn = test_db();
        let m = manager(3600);
        let created = m
            .create_state(&conn, "example.com", Some("10.0.0.1"), true, true)
            .expect("create");

        assert!(!created.override_locked);
        assert!(created.access_allowed);
        assert_eq!(created.expires_at, created.created_at + 3600);

        let loaded = m
            .get_state(&conn, &created.state_id)
            .expect("get")
            .expect("present");
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_ids_are_opaque_and_unique() {
        let conn = test_db();
        let m = manager(3600);
        let a = m
            .create_state(&conn, "example.com", None, true, true)
            .expect("create");
        let b = m
            .create_state(&conn, "example.com", None, true, true)
            .expect("create");
        assert_ne!(a.state_id, b.state_id);
    }

    #[test]
    fn test_override_locks_then_rejects() {
        let conn = test_db();
        let m = manager(3600);
        let created = m
            .create_state(&conn, "example.com", None, true, true)
            .expect("create");

        let overridden = m
            .override_state(&conn, &created.state_id, false)
            .expect("first override");
        assert!(!overridden.access_allowed);
        assert!(overridden.override_locked);

        // Locked now; TTL remaining does not matter.
        let err = m.override_state(&conn, &created.state_id, true);
        assert!(matches!(err, Err(StateError::StateNotFound(_))));
    }

    #[test]
    fn test_states_born_locked_reject_override() {
        let conn = test_db();
        let m = manager(3600);
        let created = m
            .create_state(&conn, "example.com", None, false, true)
            .expect("create");
        assert!(created.override_locked);

        let err = m.override_state(&conn, &created.state_id, false);
        assert!(matches!(err, Err(StateError::StateNotFound(_))));
    }

    #[test]
    fn test_expired_state_swept_and_invisible_to_lookup() {
        let conn = test_db();
        let m = manager(0);
        let created = m
            .create_state(&conn, "example.com", Some("10.0.0.1"), true, false)
            .expect("create");

        // TTL 0 expires immediately: not live, not overridable.
        assert!(m
            .find_live_state(&conn, "example.com", Some("10.0.0.1"))
            .expect("find")
            .is_none());
        assert!(matches!(
            m.override_state(&conn, &created.state_id, true),
            Err(StateError::StateNotFound(_))
        ));

        // Push the expiry firmly into the past; the sweep deletes
        // strictly-expired rows.
        conn.execute("UPDATE decision_states SET expires_at = expires_at - 10", [])
            .expect("age state");
        assert_eq!(m.sweep_expired(&conn).expect("sweep"), 1);
        assert!(m
            .get_state(&conn, &created.state_id)
            .expect("get")
            .is_none());
    }

    #[test]
    fn test_find_live_state_matches_pair() {
        let conn = test_db();
        let m = manager(3600);
        m.create_state(&conn, "example.com", Some("10.0.0.1"), true, true)
            .expect("create");

        assert!(m
            .find_live_state(&conn, "example.com", Some("10.0.0.1"))
            .expect("find")
            .is_some());
        assert!(m
            .find_live_state(&conn, "example.com", Some("10.0.0.2"))
            .expect("find")
            .is_none());
        assert!(m
            .find_live_state(&conn, "other.com", Some("10.0.0.1"))
            .expect("find")
            .is_none());
    }

    #[test]
    fn test_delete_state() {
        let conn = test_db();
        let m = manager(3600);
        let created = m
            .create_state(&conn, "example.com", None, true, true)
            .expect("create");
        assert!(m.delete_state(&conn, &created.state_id).expect("delete"));
        assert!(!m.delete_state(&conn, &created.state_id).expect("again"));
    }
}
