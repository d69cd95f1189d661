//! SQL schema definitions.

/// Complete schema for the phishproof v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Ranked-list metadata
-- ============================================================

CREATE TABLE IF NOT EXISTS list_metadata (
    list_id TEXT PRIMARY KEY,
    downloaded_at INTEGER NOT NULL,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    record_count INTEGER NOT NULL DEFAULT 0,
    processed INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 0,
    purged INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_list_metadata_pending
    ON list_metadata(processed, downloaded_at);

-- ============================================================
-- Trusted domains
-- ============================================================

CREATE TABLE IF NOT EXISTS trusted_domains (
    record_id TEXT PRIMARY KEY,
    list_id TEXT NOT NULL REFERENCES list_metadata(list_id) ON DELETE CASCADE,
    original_domain TEXT NOT NULL,
    owner_label TEXT NOT NULL,
    registry_suffix TEXT NOT NULL,
    owner_length INTEGER NOT NULL,
    first_char TEXT NOT NULL,
    soundex TEXT NOT NULL,
    metaphone TEXT NOT NULL,
    double_metaphone TEXT NOT NULL,
    source_rank INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_trusted_domains_bucket
    ON trusted_domains(registry_suffix, first_char, owner_length);

CREATE INDEX IF NOT EXISTS idx_trusted_domains_exact
    ON trusted_domains(owner_label, registry_suffix);

CREATE INDEX IF NOT EXISTS idx_trusted_domains_list
    ON trusted_domains(list_id);

-- ============================================================
-- Decision states
-- ============================================================

CREATE TABLE IF NOT EXISTS decision_states (
    state_id TEXT PRIMARY KEY,
    domain_name TEXT NOT NULL,
    ip_address TEXT,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    access_allowed INTEGER NOT NULL,
    override_locked INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_decision_states_expiry
    ON decision_states(expires_at);

CREATE INDEX IF NOT EXISTS idx_decision_states_requester
    ON decision_states(domain_name, ip_address);
"#;
