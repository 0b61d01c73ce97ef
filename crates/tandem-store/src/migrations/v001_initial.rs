//! v001 -- Initial schema creation.
//!
//! Creates the single-row `pairing_session` table holding the locally
//! cached pairing projection.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Pairing session (one row per device)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS pairing_session (
    id                INTEGER PRIMARY KEY CHECK (id = 1),
    current_user_name TEXT NOT NULL,
    partner_name      TEXT NOT NULL,
    heart_name        TEXT NOT NULL,
    heart_code        TEXT NOT NULL DEFAULT '',  -- empty = unbound
    is_paired         INTEGER NOT NULL DEFAULT 0,
    is_creator        INTEGER NOT NULL DEFAULT 0,
    needs_repairing   INTEGER NOT NULL DEFAULT 0
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
