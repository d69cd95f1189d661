//! Trusted-domain store queries.

use phishproof_types::{DomainFeatures, PhoneticCodes, TrustedDomainRecord};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::{DbError, Result};

const RECORD_COLUMNS: &str = "record_id, list_id, original_domain, owner_label, \
     registry_suffix, owner_length, first_char, soundex, metaphone, \
     double_metaphone, source_rank";

/// Bulk-insert extracted features under an existing list.
///
/// Fails with [`DbError::UnknownList`] when no metadata row exists for
/// `list_id`: list metadata is always created before its domains.
pub fn insert_batch(conn: &Connection, list_id: &str, features: &[DomainFeatures]) -> Result<()> {
    let known: i64 = conn.query_row(
        "SELECT COUNT(*) FROM list_metadata WHERE list_id = ?1",
        [list_id],
        |row| row.get(0),
    )?;
    if known == 0 {
        return Err(DbError::UnknownList(list_id.to_string()));
    }

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO trusted_domains (record_id, list_id, original_domain, owner_label,
                 registry_suffix, owner_length, first_char, soundex, metaphone,
                 double_metaphone, source_rank)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for f in features {
            stmt.execute(rusqlite::params![
                Uuid::new_v4().to_string(),
                list_id,
                f.original_domain,
                f.owner_label,
                f.registry_suffix,
                f.owner_length as i64,
                f.first_char.to_string(),
                f.phonetic.soundex,
                f.phonetic.metaphone,
                f.phonetic.double_metaphone,
                f.source_rank as i64,
            ])?;
        }
    }
    tx.commit()?;
    tracing::debug!(list_id, count = features.len(), "inserted domain batch");
    Ok(())
}

/// Exact corpus hit for an owner label under a registry suffix.
pub fn exact_match(
    conn: &Connection,
    owner_label: &str,
    registry_suffix: &str,
) -> Result<Option<TrustedDomainRecord>> {
    conn.query_row(
        &format!(
            "SELECT {RECORD_COLUMNS} FROM trusted_domains
             WHERE owner_label = ?1 AND registry_suffix = ?2"
        ),
        [owner_label, registry_suffix],
        map_record,
    )
    .optional()
    .map_err(DbError::Sqlite)
}

/// Candidate records for a squat check, drawn from the active list
/// only.
///
/// Candidates share the query's registry suffix and first character
/// and have an owner-label length inside the inclusive window. Both
/// filters are pruning heuristics: an edit that changes the first
/// character falls outside the bucket by design. Row order is
/// unspecified.
pub fn candidates_for_squat_check(
    conn: &Connection,
    length_low: usize,
    length_high: usize,
    first_char: char,
    registry_suffix: &str,
) -> Result<Vec<TrustedDomainRecord>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {RECORD_COLUMNS} FROM trusted_domains AS d
         JOIN list_metadata AS l ON l.list_id = d.list_id
         WHERE l.active = 1
           AND d.registry_suffix = ?1
           AND d.first_char = ?2
           AND d.owner_length BETWEEN ?3 AND ?4"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![
                registry_suffix,
                first_char.to_string(),
                length_low as i64,
                length_high as i64,
            ],
            map_record,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Remove all domain rows belonging to one list. Returns the number of
/// rows removed.
pub fn purge_by_list(conn: &Connection, list_id: &str) -> Result<usize> {
    let removed = conn.execute("DELETE FROM trusted_domains WHERE list_id = ?1", [list_id])?;
    if removed > 0 {
        tracing::debug!(list_id, removed, "purged domains for list");
    }
    Ok(removed)
}

/// Remove every trusted-domain row.
pub fn purge_all(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM trusted_domains", [])?;
    tracing::info!(removed, "purged all trusted domains");
    Ok(removed)
}

/// Number of domain rows stored for one list.
pub fn count_by_list(conn: &Connection, list_id: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM trusted_domains WHERE list_id = ?1",
        [list_id],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrustedDomainRecord> {
    let first_char: String = row.get(6)?;
    Ok(TrustedDomainRecord {
        record_id: row.get(0)?,
        list_id: row.get(1)?,
        features: DomainFeatures {
            original_domain: row.get(2)?,
            owner_label: row.get(3)?,
            registry_suffix: row.get(4)?,
            owner_length: row.get::<_, i64>(5)? as usize,
            first_char: first_char.chars().next().unwrap_or('\0'),
            phonetic: PhoneticCodes {
                soundex: row.get(7)?,
                metaphone: row.get(8)?,
                double_metaphone: row.get(9)?,
            },
            source_rank: row.get::<_, i64>(10)? as u64,
        },
    })
}
