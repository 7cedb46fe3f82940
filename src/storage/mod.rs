//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - DialogueLines(ID, Text)
//! - DialogueGroups(ID, Elements)
//!
//! Every write opens its own connection and transaction. Caches are refreshed
//! only by full reloads.

pub mod connection;
pub mod groups;
pub mod lines;
pub mod schema;

pub use connection::{in_transaction, ConnectionSource};
pub use groups::GroupStore;
pub use lines::LineStore;

/// Fresh database in a temporary directory with the schema applied
#[cfg(test)]
pub(crate) fn scratch_source() -> (tempfile::TempDir, ConnectionSource) {
    let dir = tempfile::TempDir::new().unwrap();
    let source = ConnectionSource::new(dir.path().join("dialogue.db"));
    schema::ensure_schema(&source.open().unwrap()).unwrap();
    (dir, source)
}
