//! SQLite store for birthday entries and the dispatch log.

use birthday_types::BirthdayRecord;
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use std::sync::Mutex;

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    pub fn open(path: &str) -> SqliteResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS birthdays (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT,
                phone TEXT,
                birthday TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        // One row per successful greeting, keyed by calendar date, so a
        // re-run of the daily job does not greet the same person twice.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS dispatch_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                birthday_id INTEGER NOT NULL,
                sent_on TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (birthday_id) REFERENCES birthdays(id) ON DELETE CASCADE,
                UNIQUE(birthday_id, sent_on)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_birthdays_birthday ON birthdays(birthday)",
            [],
        )?;

        Ok(())
    }

    pub fn insert_birthday(
        &self,
        name: Option<&str>,
        phone: Option<&str>,
        birthday: Option<&str>,
    ) -> SqliteResult<BirthdayRecord> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO birthdays (name, phone, birthday, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![name, phone, birthday, now],
        )?;

        let id = conn.last_insert_rowid();
        Ok(BirthdayRecord {
            id,
            name: name.map(|s| s.to_string()),
            phone: phone.map(|s| s.to_string()),
            birthday: birthday.map(|s| s.to_string()),
            created_at: now,
        })
    }

    /// Full unfiltered read, in insertion order. The daily job reads the whole
    /// table once; there is no pagination.
    pub fn list_birthdays(&self) -> SqliteResult<Vec<BirthdayRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, phone, birthday, created_at FROM birthdays ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map([], row_to_birthday)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(entries)
    }

    pub fn count_birthdays(&self) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM birthdays", [], |row| row.get(0))
    }

    /// Whether a greeting already went out to this entry on `sent_on` (`DD-MM-YYYY`).
    pub fn was_sent_on(&self, birthday_id: i64, sent_on: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let hit: Option<i64> = conn
            .query_row(
                "SELECT id FROM dispatch_log WHERE birthday_id = ?1 AND sent_on = ?2",
                rusqlite::params![birthday_id, sent_on],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    pub fn mark_sent(&self, birthday_id: i64, sent_on: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO dispatch_log (birthday_id, sent_on) VALUES (?1, ?2)",
            rusqlite::params![birthday_id, sent_on],
        )?;
        Ok(())
    }
}

fn row_to_birthday(row: &rusqlite::Row) -> SqliteResult<BirthdayRecord> {
    Ok(BirthdayRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        birthday: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_list() {
        let db = Db::open(":memory:").unwrap();
        db.insert_birthday(Some("Ada"), Some("08012345678"), Some("05-03"))
            .unwrap();
        db.insert_birthday(Some("Grace"), None, Some("15-08")).unwrap();

        let entries = db.list_birthdays().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name.as_deref(), Some("Ada"));
        assert_eq!(entries[0].birthday.as_deref(), Some("05-03"));
        assert_eq!(entries[1].phone, None);
        assert_eq!(db.count_birthdays().unwrap(), 2);
    }

    #[test]
    fn test_missing_fields_stored_as_null() {
        let db = Db::open(":memory:").unwrap();
        let rec = db.insert_birthday(None, None, None).unwrap();
        assert_eq!(rec.name, None);

        let entries = db.list_birthdays().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].birthday, None);
    }

    #[test]
    fn test_duplicates_allowed() {
        let db = Db::open(":memory:").unwrap();
        db.insert_birthday(Some("Ada"), Some("08012345678"), Some("05-03"))
            .unwrap();
        db.insert_birthday(Some("Ada"), Some("08012345678"), Some("05-03"))
            .unwrap();
        assert_eq!(db.list_birthdays().unwrap().len(), 2);
    }

    #[test]
    fn test_dispatch_log() {
        let db = Db::open(":memory:").unwrap();
        let rec = db
            .insert_birthday(Some("Ada"), Some("08012345678"), Some("05-03"))
            .unwrap();

        assert!(!db.was_sent_on(rec.id, "05-03-2026").unwrap());
        db.mark_sent(rec.id, "05-03-2026").unwrap();
        assert!(db.was_sent_on(rec.id, "05-03-2026").unwrap());
        // A different day is a fresh slate
        assert!(!db.was_sent_on(rec.id, "05-03-2027").unwrap());

        // Marking twice is a no-op
        db.mark_sent(rec.id, "05-03-2026").unwrap();
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birthdays.db");
        let db = Db::open(path.to_str().unwrap()).unwrap();
        db.insert_birthday(Some("Ada"), None, None).unwrap();
        assert_eq!(db.count_birthdays().unwrap(), 1);
    }
}
