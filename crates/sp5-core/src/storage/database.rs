//! SQLite-backed record store and alarm table.
//!
//! Two tables:
//! - `kv`: the timer record, serialized as JSON under [`RECORD_KEY`]
//! - `alarms`: one row per pending wake-up, keyed by alarm name
//!
//! Because alarms live on disk, a wake-up scheduled by one process can be
//! fired by the next one that opens the database.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::alarm::{Alarm, AlarmName};
use crate::error::{DatabaseError, Result};
use crate::runtime::{AlarmScheduler, RecordStore};
use crate::timer::TimerRecord;

/// Key of the timer record in the `kv` table.
pub const RECORD_KEY: &str = "sp5_record";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/sp5.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(data_dir()?.join("sp5.db"))
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS alarms (
                name            TEXT PRIMARY KEY,
                scheduled_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_alarms_scheduled_at ON alarms(scheduled_at_ms);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl RecordStore for Database {
    fn load(&self) -> Result<Option<TimerRecord>> {
        match self.kv_get(RECORD_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, record: &TimerRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.kv_set(RECORD_KEY, &json)?;
        Ok(())
    }
}

impl AlarmScheduler for Database {
    fn schedule(&mut self, name: AlarmName, at_ms: u64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO alarms (name, scheduled_at_ms) VALUES (?1, ?2)",
            params![name.as_str(), i64::try_from(at_ms).unwrap_or(i64::MAX)],
        )?;
        Ok(())
    }

    fn cancel(&mut self, name: AlarmName) -> Result<()> {
        self.conn
            .execute("DELETE FROM alarms WHERE name = ?1", params![name.as_str()])?;
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM alarms", [])?;
        Ok(())
    }

    fn get(&self, name: AlarmName) -> Result<Option<Alarm>> {
        let at = self
            .conn
            .query_row(
                "SELECT scheduled_at_ms FROM alarms WHERE name = ?1",
                params![name.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(at.map(|at| Alarm {
            name,
            scheduled_at_ms: at.max(0) as u64,
        }))
    }

    fn pending(&self) -> Result<Vec<Alarm>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, scheduled_at_ms FROM alarms ORDER BY scheduled_at_ms, name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut alarms = Vec::new();
        for row in rows {
            let (name, at) = row?;
            match name.parse::<AlarmName>() {
                Ok(name) => alarms.push(Alarm {
                    name,
                    scheduled_at_ms: at.max(0) as u64,
                }),
                Err(e) => tracing::warn!(error = %e, "skipping unknown alarm row"),
            }
        }
        Ok(alarms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{ActivePhase, TimerState};
    use chrono::NaiveDate;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn record_is_overwritten_in_place() {
        let mut db = Database::open_memory().unwrap();
        assert!(db.load().unwrap().is_none());

        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut record = TimerRecord::new(5, day);
        db.save(&record).unwrap();
        record.state = TimerState::Paused {
            remaining_ms: 1_000,
            previous: ActivePhase::Break,
        };
        db.save(&record).unwrap();

        assert_eq!(db.load().unwrap(), Some(record));
        let rows: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let db = Database::open_memory().unwrap();
        db.kv_set(RECORD_KEY, "{\"timerState\":\"sleeping\"}").unwrap();
        assert!(db.load().is_err());
    }

    #[test]
    fn scheduling_replaces_same_name() {
        let mut db = Database::open_memory().unwrap();
        db.schedule(AlarmName::PhaseTimer, 500).unwrap();
        db.schedule(AlarmName::BadgeRefresh, 100).unwrap();
        db.schedule(AlarmName::PhaseTimer, 50).unwrap();

        let pending = db.pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].name, AlarmName::PhaseTimer);
        assert_eq!(pending[0].scheduled_at_ms, 50);

        db.cancel(AlarmName::PhaseTimer).unwrap();
        assert!(db.get(AlarmName::PhaseTimer).unwrap().is_none());
        db.cancel_all().unwrap();
        assert!(db.pending().unwrap().is_empty());
    }

    #[test]
    fn far_future_alarm_is_clamped_not_wrapped() {
        let mut db = Database::open_memory().unwrap();
        db.schedule(AlarmName::PhaseTimer, u64::MAX).unwrap();
        db.schedule(AlarmName::BadgeRefresh, 100).unwrap();

        let pending = db.pending().unwrap();
        assert_eq!(pending[0].name, AlarmName::BadgeRefresh);
        assert_eq!(pending[1].scheduled_at_ms, i64::MAX as u64);
        assert_eq!(
            db.get(AlarmName::PhaseTimer).unwrap().map(|a| a.scheduled_at_ms),
            Some(i64::MAX as u64)
        );
    }
}
