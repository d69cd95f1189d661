//! ListMetadata lifecycle queries.

use phishproof_types::ListMetadata;
use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// Outcome of attempting to create list metadata.
///
/// A duplicate create is benign: the caller receives the existing row
/// and branches on the variant as ordinary control flow.
#[derive(Debug)]
pub enum ListCreate {
    Created(ListMetadata),
    AlreadyExists(ListMetadata),
}

impl ListCreate {
    /// The metadata row, however it came to exist.
    pub fn into_metadata(self) -> ListMetadata {
        match self {
            Self::Created(m) | Self::AlreadyExists(m) => m,
        }
    }
}

/// Create metadata for a freshly downloaded list.
pub fn create(
    conn: &Connection,
    list_id: &str,
    downloaded_at: u64,
    size_bytes: u64,
) -> Result<ListCreate> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO list_metadata (list_id, downloaded_at, size_bytes)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![list_id, downloaded_at as i64, size_bytes as i64],
    )?;
    let row = get(conn, list_id)?.ok_or_else(|| DbError::NotFound(format!("list {list_id}")))?;
    if inserted == 0 {
        tracing::debug!(list_id, "list metadata already present");
        Ok(ListCreate::AlreadyExists(row))
    } else {
        Ok(ListCreate::Created(row))
    }
}

/// Fetch metadata for one list.
pub fn get(conn: &Connection, list_id: &str) -> Result<Option<ListMetadata>> {
    conn.query_row(
        "SELECT list_id, downloaded_at, size_bytes, record_count, processed, active, purged
         FROM list_metadata WHERE list_id = ?1",
        [list_id],
        map_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// The most recently downloaded list that has not been processed yet.
pub fn latest_unprocessed(conn: &Connection) -> Result<Option<ListMetadata>> {
    conn.query_row(
        "SELECT list_id, downloaded_at, size_bytes, record_count, processed, active, purged
         FROM list_metadata
         WHERE processed = 0 AND purged = 0
         ORDER BY downloaded_at DESC
         LIMIT 1",
        [],
        map_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// The currently active list, if any.
pub fn active(conn: &Connection) -> Result<Option<ListMetadata>> {
    conn.query_row(
        "SELECT list_id, downloaded_at, size_bytes, record_count, processed, active, purged
         FROM list_metadata WHERE active = 1",
        [],
        map_row,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// Processed lists that are neither active nor purged, oldest first.
pub fn inactive_processed(conn: &Connection) -> Result<Vec<ListMetadata>> {
    let mut stmt = conn.prepare(
        "SELECT list_id, downloaded_at, size_bytes, record_count, processed, active, purged
         FROM list_metadata
         WHERE processed = 1 AND active = 0 AND purged = 0
         ORDER BY downloaded_at ASC",
    )?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Record that every row of a list has been loaded into the store.
pub fn mark_processed(conn: &Connection, list_id: &str, record_count: u64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE list_metadata SET processed = 1, record_count = ?2 WHERE list_id = ?1",
        rusqlite::params![list_id, record_count as i64],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("list {list_id}")));
    }
    Ok(())
}

/// Make one processed list the active one.
///
/// Deactivate-all and activate-one run in a single transaction, so a
/// concurrent reader never observes zero or two active lists.
pub fn activate(conn: &Connection, list_id: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    let eligible: i64 = tx.query_row(
        "SELECT COUNT(*) FROM list_metadata WHERE list_id = ?1 AND processed = 1",
        [list_id],
        |row| row.get(0),
    )?;
    if eligible == 0 {
        return Err(DbError::NotFound(format!("processed list {list_id}")));
    }
    tx.execute("UPDATE list_metadata SET active = 0 WHERE active = 1", [])?;
    tx.execute(
        "UPDATE list_metadata SET active = 1 WHERE list_id = ?1",
        [list_id],
    )?;
    tx.commit()?;
    tracing::info!(list_id, "list activated");
    Ok(())
}

/// Mark a superseded list purged.
pub fn mark_purged(conn: &Connection, list_id: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE list_metadata SET purged = 1 WHERE list_id = ?1",
        [list_id],
    )?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("list {list_id}")));
    }
    Ok(())
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListMetadata> {
    Ok(ListMetadata {
        list_id: row.get(0)?,
        downloaded_at: row.get::<_, i64>(1)? as u64,
        size_bytes: row.get::<_, i64>(2)? as u64,
        record_count: row.get::<_, i64>(3)? as u64,
        processed: row.get(4)?,
        active: row.get(5)?,
        purged: row.get(6)?,
    })
}
