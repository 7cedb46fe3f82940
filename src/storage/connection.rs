//! Connection source and transaction helpers

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::config::StoreConfig;
use crate::{Entity, Error, Result};

/// Hands out one SQLite connection per unit of work.
///
/// There is no pooling: every call to [`open`](Self::open) creates a fresh
/// connection that is dropped when the caller is done with it.
#[derive(Debug, Clone)]
pub struct ConnectionSource {
    location: PathBuf,
    busy_timeout: Duration,
}

impl ConnectionSource {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.database).with_busy_timeout(config.busy_timeout())
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// The default location used by [`open`](Self::open)
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Open a connection to the default location (creates the file if missing)
    pub fn open(&self) -> Result<Connection> {
        self.open_at(&self.location)
    }

    /// Open a connection to an explicit location
    pub fn open_at(&self, location: &Path) -> Result<Connection> {
        let conn = Connection::open(location)?;
        conn.busy_timeout(self.busy_timeout)?;
        tracing::trace!("Opened connection to {}", location.display());
        Ok(conn)
    }
}

/// Run `body` inside an immediate transaction.
///
/// Commits when `body` succeeds. On failure the transaction is rolled back and
/// the error from `body` is returned unchanged.
pub fn in_transaction<T, F>(conn: &mut Connection, body: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match body(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!("Rolling back transaction: {}", err);
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// Check that a keyed write touched exactly one row
pub fn expect_single_row(
    affected: usize,
    entity: Entity,
    key: impl std::fmt::Display,
    operation: &'static str,
) -> Result<()> {
    match affected {
        1 => Ok(()),
        0 => Err(Error::not_found(entity, key)),
        affected => Err(Error::RowCountViolation {
            entity,
            key: key.to_string(),
            operation,
            affected,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::scratch_source as scratch;
    use crate::ErrorKind;

    fn count_lines(source: &ConnectionSource) -> i64 {
        source
            .open()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM DialogueLines", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_on_success() {
        let (_dir, source) = scratch();
        let mut conn = source.open().unwrap();

        let id = in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO DialogueLines (Text) VALUES (?1)", ["Hello"])?;
            Ok(tx.last_insert_rowid())
        })
        .unwrap();

        assert_eq!(id, 1);
        assert_eq!(count_lines(&source), 1);
    }

    #[test]
    fn test_rollback_returns_original_error() {
        let (_dir, source) = scratch();
        let mut conn = source.open().unwrap();

        let err = in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO DialogueLines (Text) VALUES (?1)", ["Hello"])?;
            Err::<(), _>(Error::not_found(Entity::Line, 99))
        })
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(count_lines(&source), 0);
    }

    #[test]
    fn test_expect_single_row() {
        assert!(expect_single_row(1, Entity::Line, 1, "update").is_ok());
        assert_eq!(
            expect_single_row(0, Entity::Line, 1, "update").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            expect_single_row(3, Entity::Line, 1, "delete").unwrap_err().kind(),
            ErrorKind::InvariantViolation
        );
    }

    #[test]
    fn test_open_at_explicit_location() {
        let (dir, source) = scratch();
        let other = dir.path().join("other.db");
        source.open_at(&other).unwrap();
        assert!(other.exists());
        assert_eq!(source.location(), dir.path().join("dialogue.db"));
    }
}
