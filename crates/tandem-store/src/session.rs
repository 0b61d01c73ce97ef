//! Persistence for the pairing-session snapshot.
//!
//! The snapshot is written on every session mutation and read back on
//! process start so the last known pairing state renders without a network
//! round trip.

use rusqlite::params;

use tandem_shared::{HeartCode, PairingSnapshot};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Persist the session snapshot, replacing any previous one.
    pub fn save_session(&self, snapshot: &PairingSnapshot) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO pairing_session
             (id, current_user_name, partner_name, heart_name, heart_code,
              is_paired, is_creator, needs_repairing)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                snapshot.current_user_name,
                snapshot.partner_name,
                snapshot.heart_name,
                snapshot
                    .heart_code
                    .as_ref()
                    .map(|c| c.as_str())
                    .unwrap_or(""),
                snapshot.is_paired,
                snapshot.is_creator,
                snapshot.needs_repairing,
            ],
        )?;
        Ok(())
    }

    /// Load the persisted snapshot, if any.
    pub fn load_session(&self) -> Result<Option<PairingSnapshot>> {
        let row = self
            .conn()
            .query_row(
                "SELECT current_user_name, partner_name, heart_name, heart_code,
                        is_paired, is_creator, needs_repairing
                 FROM pairing_session
                 WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, bool>(4)?,
                        row.get::<_, bool>(5)?,
                        row.get::<_, bool>(6)?,
                    ))
                },
            );

        let (current_user_name, partner_name, heart_name, code_str, is_paired, is_creator, needs_repairing) =
            match row {
                Ok(values) => values,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

        let heart_code = if code_str.is_empty() {
            None
        } else {
            Some(HeartCode::parse(&code_str)?)
        };

        Ok(Some(PairingSnapshot {
            current_user_name,
            partner_name,
            heart_name,
            heart_code,
            is_paired,
            is_creator,
            needs_repairing,
        }))
    }

    /// Remove the persisted snapshot entirely.
    pub fn clear_session(&self) -> Result<()> {
        self.conn()
            .execute("DELETE FROM pairing_session WHERE id = 1", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_dir, db) = open_db();

        let snapshot = PairingSnapshot {
            current_user_name: "Alex".to_string(),
            partner_name: "Sam".to_string(),
            heart_name: "Us".to_string(),
            heart_code: Some(HeartCode::parse("A1B2C3").unwrap()),
            is_paired: true,
            is_creator: true,
            needs_repairing: false,
        };

        db.save_session(&snapshot).unwrap();
        let loaded = db.load_session().unwrap().expect("should have a snapshot");
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_without_save_is_none() {
        let (_dir, db) = open_db();
        assert!(db.load_session().unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites_previous_row() {
        let (_dir, db) = open_db();

        let mut snapshot = PairingSnapshot::default();
        snapshot.current_user_name = "Alex".to_string();
        db.save_session(&snapshot).unwrap();

        snapshot.needs_repairing = true;
        db.save_session(&snapshot).unwrap();

        let loaded = db.load_session().unwrap().unwrap();
        assert!(loaded.needs_repairing);
    }

    #[test]
    fn test_clear_session() {
        let (_dir, db) = open_db();

        db.save_session(&PairingSnapshot::default()).unwrap();
        db.clear_session().unwrap();
        assert!(db.load_session().unwrap().is_none());
    }
}
