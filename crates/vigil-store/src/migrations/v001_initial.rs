//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `messages`, `alerts`, and the
//! single-slot `session` pointer.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (full directory shadow, keyed by normalized address)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    address       TEXT PRIMARY KEY NOT NULL,  -- normalized address
    id            TEXT NOT NULL,              -- UUID v4
    name          TEXT NOT NULL,
    secret        TEXT NOT NULL,
    danger_phrase TEXT NOT NULL,
    guardians     TEXT NOT NULL               -- JSON array of addresses
);

-- ----------------------------------------------------------------
-- Messages (backup map: pair key -> conversation)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id        TEXT PRIMARY KEY NOT NULL,      -- UUID v4, dedup key
    pair_key  TEXT NOT NULL,
    sender    TEXT NOT NULL,
    receiver  TEXT NOT NULL,
    text      TEXT NOT NULL,
    timestamp TEXT NOT NULL,                  -- ISO-8601 / RFC-3339
    latitude  REAL,
    longitude REAL
);

CREATE INDEX IF NOT EXISTS idx_messages_pair_ts
    ON messages(pair_key, timestamp ASC);

-- ----------------------------------------------------------------
-- Alerts (backup map: recipient -> inbox)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS alerts (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4, dedup key
    recipient    TEXT NOT NULL,
    sender       TEXT NOT NULL,
    reason       TEXT NOT NULL,               -- stable reason code
    timestamp    TEXT NOT NULL,
    latitude     REAL,
    longitude    REAL,
    acknowledged INTEGER NOT NULL DEFAULT 0   -- boolean 0/1
);

CREATE INDEX IF NOT EXISTS idx_alerts_recipient_ts
    ON alerts(recipient, timestamp DESC);

-- ----------------------------------------------------------------
-- Session (single slot pointing at the signed-in user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS session (
    id      INTEGER PRIMARY KEY CHECK (id = 1),
    address TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
