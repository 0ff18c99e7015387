//! Client-local persistence for Rigsheet

mod connection;
mod snapshot;

pub use connection::Database;
pub use snapshot::{
    SnapshotPersistence, SnapshotRepository, SqliteSnapshotRepository, SNAPSHOT_VERSION,
};
