//! Dialogue line store

use rusqlite::{params, OptionalExtension};

use super::connection::{expect_single_row, in_transaction, ConnectionSource};
use crate::cache::{ReloadStrategy, ReloadableCache};
use crate::line::DialogueLine;
use crate::{Entity, Error, Result};

/// Transactional access to the `DialogueLines` table, mirrored in a cache of ID → text.
pub struct LineStore {
    source: ConnectionSource,
    cache: ReloadableCache<i64, String>,
}

impl LineStore {
    pub fn new(source: ConnectionSource, strategy: ReloadStrategy) -> Self {
        Self {
            source,
            cache: ReloadableCache::new("dialogue lines", strategy),
        }
    }

    pub fn cache(&self) -> &ReloadableCache<i64, String> {
        &self.cache
    }

    /// Fetch a line's text, from the cache or directly from the store
    pub fn fetch(&self, id: i64, use_cache: bool) -> Result<String> {
        if use_cache {
            self.fetch_from_cache(id)
        } else {
            self.fetch_from_store(id)
        }
    }

    pub fn fetch_from_cache(&self, id: i64) -> Result<String> {
        self.cache
            .get(&id)
            .ok_or_else(|| Error::not_found(Entity::Line, id))
    }

    pub fn fetch_from_store(&self, id: i64) -> Result<String> {
        let conn = self.source.open()?;
        let text: Option<Option<String>> = conn
            .query_row(
                "SELECT Text FROM DialogueLines WHERE ID = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        match text {
            Some(text) => Ok(text.unwrap_or_default()),
            None => Err(Error::not_found(Entity::Line, id)),
        }
    }

    /// Read every line, ordered by ID
    pub fn list(&self) -> Result<Vec<DialogueLine>> {
        let conn = self.source.open()?;
        let mut stmt = conn.prepare("SELECT ID, Text FROM DialogueLines ORDER BY ID")?;

        let lines = stmt
            .query_map([], |row| {
                let text: Option<String> = row.get(1)?;
                Ok(DialogueLine::new(row.get(0)?, text.unwrap_or_default()))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(lines)
    }

    /// Replace the cache with a full scan of the table
    pub fn initialize_cache(&self) -> Result<usize> {
        self.cache.reload(|| {
            let lines = self.list()?;
            Ok(lines.into_iter().map(|line| (line.id, line.text)).collect())
        })
    }

    /// Insert a new line and return its store-assigned ID
    pub fn insert(&self, text: &str, refresh_cache: bool) -> Result<i64> {
        let mut conn = self.source.open()?;
        let id = in_transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO DialogueLines (Text) VALUES (?1)", [text])?;
            Ok(tx.last_insert_rowid())
        })?;
        tracing::debug!(id, "Inserted dialogue line");

        self.refresh(refresh_cache)?;
        Ok(id)
    }

    /// Replace the text of an existing line
    pub fn update(&self, id: i64, text: &str, refresh_cache: bool) -> Result<()> {
        let mut conn = self.source.open()?;
        in_transaction(&mut conn, |tx| {
            let affected = tx.execute(
                "UPDATE DialogueLines SET Text = ?1 WHERE ID = ?2",
                params![text, id],
            )?;
            expect_single_row(affected, Entity::Line, id, "update")
        })?;
        tracing::debug!(id, "Updated dialogue line");

        self.refresh(refresh_cache)
    }

    pub fn delete(&self, id: i64, refresh_cache: bool) -> Result<()> {
        let mut conn = self.source.open()?;
        in_transaction(&mut conn, |tx| {
            let affected = tx.execute("DELETE FROM DialogueLines WHERE ID = ?1", [id])?;
            expect_single_row(affected, Entity::Line, id, "delete")
        })?;
        tracing::debug!(id, "Deleted dialogue line");

        self.refresh(refresh_cache)
    }

    fn refresh(&self, refresh_cache: bool) -> Result<()> {
        if refresh_cache {
            self.initialize_cache()?;
        }
        Ok(())
    }
}
