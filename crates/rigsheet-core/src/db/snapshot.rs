//! Versioned snapshot persistence for the local report aggregate

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{is_valid_category, ReportData};
use crate::store::SnapshotSink;

use super::Database;

/// Version of the persisted snapshot payload.
///
/// Bumped whenever the category enumeration changes; the load path drops
/// categories outside the current valid set regardless, so older snapshots
/// migrate in place on first load.
pub const SNAPSHOT_VERSION: i64 = 2;

/// Trait for snapshot storage operations
pub trait SnapshotRepository {
    /// Persist the aggregate and its last-local-edit time
    fn save(&self, data: &ReportData, last_local_edit: i64) -> Result<()>;

    /// Load the persisted aggregate, if any, with its last-local-edit time
    fn load(&self) -> Result<Option<(ReportData, i64)>>;

    /// Remove the persisted snapshot
    fn clear(&self) -> Result<()>;
}

/// `SQLite` implementation of [`SnapshotRepository`]
pub struct SqliteSnapshotRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSnapshotRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn save(&self, data: &ReportData, last_local_edit: i64) -> Result<()> {
        let payload = serde_json::to_string(data)?;
        self.conn.execute(
            "INSERT INTO report_snapshot (id, version, data, last_local_edit)
             VALUES (1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 version = excluded.version,
                 data = excluded.data,
                 last_local_edit = excluded.last_local_edit",
            params![SNAPSHOT_VERSION, payload, last_local_edit],
        )?;
        Ok(())
    }

    fn load(&self) -> Result<Option<(ReportData, i64)>> {
        let row: Option<(i64, String, i64)> = self
            .conn
            .query_row(
                "SELECT version, data, last_local_edit FROM report_snapshot WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((version, payload, last_local_edit)) = row else {
            return Ok(None);
        };

        let mut data: ReportData = serde_json::from_str(&payload)?;
        let before = data.categories.len();
        data.categories
            .retain(|category| is_valid_category(&category.id));
        if data.categories.len() != before {
            tracing::info!(
                stored_version = version,
                dropped = before - data.categories.len(),
                "Dropped categories outside the current valid set"
            );
        }

        Ok(Some((data, last_local_edit)))
    }

    fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM report_snapshot WHERE id = 1", [])?;
        Ok(())
    }
}

/// Subscriber that serializes every accepted transition to the database.
///
/// Write failures are logged and swallowed; persistence must never break the
/// mutation path.
pub struct SnapshotPersistence {
    db: Database,
}

impl SnapshotPersistence {
    /// Take ownership of the database for persistence
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SnapshotSink for SnapshotPersistence {
    fn snapshot_accepted(&self, data: &ReportData, last_local_edit: i64) {
        let repo = SqliteSnapshotRepository::new(self.db.connection());
        if let Err(error) = repo.save(data, last_local_edit) {
            tracing::warn!(%error, "Failed to persist report snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Category, InspectionFields};
    use crate::store::LocalReport;

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn save_and_load_round_trip() {
        let db = setup();
        let repo = SqliteSnapshotRepository::new(db.connection());

        let data = ReportData {
            inspection: InspectionFields {
                tag: "T-1".to_string(),
                ..InspectionFields::default()
            },
            conclusion: "done".to_string(),
            ..ReportData::default()
        };
        repo.save(&data, 123).unwrap();

        let (loaded, last_local_edit) = repo.load().unwrap().unwrap();
        assert_eq!(loaded, data);
        assert_eq!(last_local_edit, 123);
    }

    #[test]
    fn load_of_empty_store_returns_none() {
        let db = setup();
        let repo = SqliteSnapshotRepository::new(db.connection());
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn load_drops_categories_outside_the_valid_set() {
        let db = setup();
        let repo = SqliteSnapshotRepository::new(db.connection());

        let mut data = ReportData::default();
        data.categories.push(Category::new("engine"));
        data.categories.push(Category::new("retired_category"));
        data.categories.push(Category::new("hydraulic"));
        repo.save(&data, 0).unwrap();

        let (loaded, _) = repo.load().unwrap().unwrap();
        let ids: Vec<&str> = loaded
            .categories
            .iter()
            .map(|category| category.id.as_str())
            .collect();
        assert_eq!(ids, vec!["engine", "hydraulic"]);
    }

    #[test]
    fn clear_removes_the_snapshot() {
        let db = setup();
        let repo = SqliteSnapshotRepository::new(db.connection());
        repo.save(&ReportData::default(), 0).unwrap();
        repo.clear().unwrap();
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn persistence_subscriber_saves_on_every_transition() {
        // The sink owns its own connection; open a second handle to verify.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.db");
        let sink_db = Database::open(&path).unwrap();

        let mut local = LocalReport::new();
        local.subscribe(Box::new(SnapshotPersistence::new(sink_db)));
        local.set_field("tag", "T-7");
        local.set_conclusion("wrapped up");

        let verify_db = Database::open(&path).unwrap();
        let repo = SqliteSnapshotRepository::new(verify_db.connection());
        let (loaded, last_local_edit) = repo.load().unwrap().unwrap();
        assert_eq!(loaded.inspection.tag, "T-7");
        assert_eq!(loaded.conclusion, "wrapped up");
        assert!(last_local_edit > 0);
    }
}
