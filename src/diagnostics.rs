//! Connectivity probe
//!
//! The one place where store failures are reduced to a boolean.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

/// Check that `location` is an existing, readable SQLite database.
///
/// Unlike [`ConnectionSource::open`](crate::ConnectionSource::open), the probe
/// never creates a missing file.
pub fn test_connection(location: &Path) -> bool {
    match probe(location) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!("Connection probe for {} failed: {}", location.display(), err);
            false
        }
    }
}

fn probe(location: &Path) -> rusqlite::Result<()> {
    let conn = Connection::open_with_flags(
        location,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::scratch_source;
    use tempfile::TempDir;

    #[test]
    fn test_existing_database() {
        let (_dir, source) = scratch_source();
        assert!(test_connection(source.location()));
    }

    #[test]
    fn test_missing_file_is_not_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.db");
        assert!(!test_connection(&path));
        assert!(!path.exists());
    }

    #[test]
    fn test_non_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "this is not a database, just some text that is long enough").unwrap();
        assert!(!test_connection(&path));
    }
}
