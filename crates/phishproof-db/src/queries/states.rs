//! Decision-state queries.

use phishproof_types::DecisionState;
use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

const STATE_COLUMNS: &str = "state_id, domain_name, ip_address, created_at, expires_at, \
     access_allowed, override_locked";

/// Persist a freshly created state.
pub fn insert(conn: &Connection, state: &DecisionState) -> Result<()> {
    conn.execute(
        "INSERT INTO decision_states (state_id, domain_name, ip_address, created_at,
             expires_at, access_allowed, override_locked)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            state.state_id,
            state.domain_name,
            state.ip_address,
            state.created_at as i64,
            state.expires_at as i64,
            state.access_allowed,
            state.override_locked,
        ],
    )?;
    Ok(())
}

/// Fetch a state by its identifier, expired or not.
pub fn get(conn: &Connection, state_id: &str) -> Result<Option<DecisionState>> {
    conn.query_row(
        &format!("SELECT {STATE_COLUMNS} FROM decision_states WHERE state_id = ?1"),
        [state_id],
        map_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// The live state for a (domain, requester) pair, if one exists.
pub fn find_live_for_requester(
    conn: &Connection,
    domain_name: &str,
    ip_address: Option<&str>,
    now: u64,
) -> Result<Option<DecisionState>> {
    conn.query_row(
        &format!(
            "SELECT {STATE_COLUMNS} FROM decision_states
             WHERE domain_name = ?1 AND ip_address IS ?2 AND expires_at > ?3"
        ),
        rusqlite::params![domain_name, ip_address, now as i64],
        map_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// Apply an access override in one guarded update.
///
/// The predicate covers liveness and the override lock, so the check
/// and the write cannot race. Returns the number of rows changed; 0
/// means missing, expired, or already locked — callers surface those
/// uniformly.
pub fn override_access(
    conn: &Connection,
    state_id: &str,
    access_allowed: bool,
    now: u64,
    new_expires_at: u64,
) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE decision_states
         SET access_allowed = ?2, expires_at = ?3, override_locked = 1
         WHERE state_id = ?1 AND expires_at > ?4 AND override_locked = 0",
        rusqlite::params![
            state_id,
            access_allowed,
            new_expires_at as i64,
            now as i64
        ],
    )?;
    Ok(changed)
}

/// Remove every expired state. Returns the number of rows removed.
pub fn delete_expired(conn: &Connection, now: u64) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM decision_states WHERE expires_at < ?1",
        [now as i64],
    )?;
    Ok(removed)
}

/// Remove a single state. Returns whether a row was removed.
pub fn delete(conn: &Connection, state_id: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM decision_states WHERE state_id = ?1", [state_id])?;
    Ok(removed > 0)
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DecisionState> {
    Ok(DecisionState {
        state_id: row.get(0)?,
        domain_name: row.get(1)?,
        ip_address: row.get(2)?,
        created_at: row.get::<_, i64>(3)? as u64,
        expires_at: row.get::<_, i64>(4)? as u64,
        access_allowed: row.get(5)?,
        override_locked: row.get(6)?,
    })
}
