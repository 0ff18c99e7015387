//! Durable session storage.
//!
//! One row per session id, holding the serialized session payload (opaque at
//! this layer) and the session's lifetime bounds. Access is deliberately
//! read-modify-write without isolation: each protocol action loads the whole
//! payload, mutates a working copy, and writes it all back, so concurrent
//! actions on the same session are last-write-wins at payload granularity.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;

/// One persisted session row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: String,
    /// Serialized session payload, opaque to the store
    pub data: String,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Storage operations keyed by session id
pub trait SessionStore: Send + Sync {
    /// Persist a freshly minted session
    fn create(&self, record: &SessionRecord) -> Result<(), AppError>;

    /// Load a session, `None` if absent
    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, AppError>;

    /// Rewrite a session's serialized payload
    fn save(&self, session_id: &str, data: &str) -> Result<(), AppError>;

    /// Remove a session; absence is not an error
    fn delete(&self, session_id: &str) -> Result<(), AppError>;
}

/// `SQLite` implementation of [`SessionStore`]
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open the store at the given path, creating the schema if needed.
    /// `:memory:` keeps sessions in process.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let conn = if path.as_ref().to_str() == Some(":memory:") {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                 session_id TEXT PRIMARY KEY,
                 data TEXT NOT NULL,
                 created_at INTEGER NOT NULL,
                 expires_at INTEGER NOT NULL
             )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::storage("sessions connection poisoned"))
    }
}

impl SessionStore for SqliteSessionStore {
    fn create(&self, record: &SessionRecord) -> Result<(), AppError> {
        self.lock()?.execute(
            "INSERT INTO sessions (session_id, data, created_at, expires_at)
             VALUES (?, ?, ?, ?)",
            params![
                record.session_id,
                record.data,
                record.created_at,
                record.expires_at
            ],
        )?;
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, AppError> {
        let record = self
            .lock()?
            .query_row(
                "SELECT session_id, data, created_at, expires_at
                 FROM sessions WHERE session_id = ?",
                params![session_id],
                |row| {
                    Ok(SessionRecord {
                        session_id: row.get(0)?,
                        data: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn save(&self, session_id: &str, data: &str) -> Result<(), AppError> {
        self.lock()?.execute(
            "UPDATE sessions SET data = ? WHERE session_id = ?",
            params![data, session_id],
        )?;
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<(), AppError> {
        self.lock()?.execute(
            "DELETE FROM sessions WHERE session_id = ?",
            params![session_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn setup() -> SqliteSessionStore {
        SqliteSessionStore::open(":memory:").unwrap()
    }

    fn record(session_id: &str) -> SessionRecord {
        SessionRecord {
            session_id: session_id.to_string(),
            data: "{}".to_string(),
            created_at: 1_000,
            expires_at: 1_000 + 86_400_000,
        }
    }

    #[test]
    fn create_then_load_round_trips() {
        let store = setup();
        let expected = record("abc12345");
        store.create(&expected).unwrap();
        assert_eq!(store.load("abc12345").unwrap().unwrap(), expected);
    }

    #[test]
    fn load_of_unknown_session_is_none() {
        let store = setup();
        assert!(store.load("missing1").unwrap().is_none());
    }

    #[test]
    fn save_rewrites_only_the_payload() {
        let store = setup();
        store.create(&record("abc12345")).unwrap();
        store.save("abc12345", r#"{"lastUpdated":5}"#).unwrap();

        let loaded = store.load("abc12345").unwrap().unwrap();
        assert_eq!(loaded.data, r#"{"lastUpdated":5}"#);
        assert_eq!(loaded.created_at, 1_000);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = setup();
        store.create(&record("abc12345")).unwrap();
        store.delete("abc12345").unwrap();
        store.delete("abc12345").unwrap();
        assert!(store.load("abc12345").unwrap().is_none());
    }
}
