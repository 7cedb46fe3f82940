//! Dialogue group store

use rusqlite::{params, OptionalExtension};

use super::connection::{in_transaction, ConnectionSource};
use crate::cache::{ReloadStrategy, ReloadableCache};
use crate::codec::{JsonSequenceCodec, SequenceCodec};
use crate::group::DialogueGroup;
use crate::{Entity, Error, Result};

/// Transactional access to the `DialogueGroups` table, mirrored in a cache of ID → group.
///
/// Group IDs are not unique at the schema level. [`insert`](Self::insert)
/// writes unconditionally; [`insert_new`](Self::insert_new) checks for an
/// existing row inside the same write transaction.
pub struct GroupStore<C = JsonSequenceCodec> {
    source: ConnectionSource,
    codec: C,
    cache: ReloadableCache<String, DialogueGroup>,
}

impl GroupStore<JsonSequenceCodec> {
    pub fn new(source: ConnectionSource, strategy: ReloadStrategy) -> Self {
        Self::with_codec(source, strategy, JsonSequenceCodec::default())
    }
}

impl<C: SequenceCodec> GroupStore<C> {
    pub fn with_codec(source: ConnectionSource, strategy: ReloadStrategy, codec: C) -> Self {
        Self {
            source,
            codec,
            cache: ReloadableCache::new("dialogue groups", strategy),
        }
    }

    pub fn cache(&self) -> &ReloadableCache<String, DialogueGroup> {
        &self.cache
    }

    pub fn fetch_from_cache(&self, id: &str) -> Result<DialogueGroup> {
        self.cache
            .get(id)
            .ok_or_else(|| Error::not_found(Entity::Group, id))
    }

    /// Fetch a group directly from the store. With duplicate IDs the earliest row wins.
    pub fn fetch_from_store(&self, id: &str) -> Result<DialogueGroup> {
        let conn = self.source.open()?;
        let row: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT ID, Elements FROM DialogueGroups WHERE ID = ?1 ORDER BY rowid LIMIT 1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((id, payload)) => self.decode(id, payload),
            None => Err(Error::not_found(Entity::Group, id)),
        }
    }

    /// Whether at least one row with this ID exists in the store
    pub fn exists(&self, id: &str) -> Result<bool> {
        let conn = self.source.open()?;
        Ok(row_exists(&conn, id)?)
    }

    /// Read and decode every group in insertion order.
    ///
    /// A row with a NULL `ID` cannot be keyed and fails the scan with
    /// [`Error::CacheLoad`].
    pub fn list(&self) -> Result<Vec<DialogueGroup>> {
        self.scan_rows()?
            .into_iter()
            .map(|(id, payload)| {
                let id = id.ok_or_else(|| {
                    Error::CacheLoad("dialogue group row with NULL ID".to_string())
                })?;
                self.decode(id, payload)
            })
            .collect()
    }

    fn scan_rows(&self) -> Result<Vec<(Option<String>, Option<String>)>> {
        let conn = self.source.open()?;
        let mut stmt = conn.prepare("SELECT ID, Elements FROM DialogueGroups ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Sorted IDs currently in the cache
    pub fn cached_ids(&self) -> Vec<String> {
        let mut ids = self.cache.keys();
        ids.sort();
        ids
    }

    /// Replace the cache with a full scan of the table.
    ///
    /// Any undecodable `Elements` payload aborts the whole reload.
    pub fn initialize_cache(&self) -> Result<usize> {
        self.cache.reload(|| {
            let groups = self.list()?;
            Ok(groups
                .into_iter()
                .map(|group| (group.id.clone(), group))
                .collect())
        })
    }

    /// Insert a row for this group without checking whether the ID is taken
    pub fn insert(&self, group: &DialogueGroup, refresh_cache: bool) -> Result<()> {
        let payload = self.codec.serialize(&group.elements)?;
        let mut conn = self.source.open()?;
        in_transaction(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO DialogueGroups (ID, Elements) VALUES (?1, ?2)",
                params![group.id, payload],
            )?;
            Ok(())
        })?;
        tracing::debug!(id = %group.id, elements = group.len(), "Inserted dialogue group");

        self.refresh(refresh_cache)
    }

    /// Insert a group, failing with [`Error::Conflict`] if the ID already exists
    pub fn insert_new(&self, group: &DialogueGroup, refresh_cache: bool) -> Result<()> {
        let payload = self.codec.serialize(&group.elements)?;
        let mut conn = self.source.open()?;
        in_transaction(&mut conn, |tx| {
            if row_exists(tx, &group.id)? {
                return Err(Error::Conflict {
                    entity: Entity::Group,
                    key: group.id.clone(),
                });
            }
            tx.execute(
                "INSERT INTO DialogueGroups (ID, Elements) VALUES (?1, ?2)",
                params![group.id, payload],
            )?;
            Ok(())
        })?;
        tracing::debug!(id = %group.id, elements = group.len(), "Inserted new dialogue group");

        self.refresh(refresh_cache)
    }

    /// Overwrite the stored elements of every row with this group's ID
    pub fn update(&self, group: &DialogueGroup, refresh_cache: bool) -> Result<()> {
        let payload = self.codec.serialize(&group.elements)?;
        let mut conn = self.source.open()?;
        let affected = in_transaction(&mut conn, |tx| {
            let affected = tx.execute(
                "UPDATE DialogueGroups SET Elements = ?1 WHERE ID = ?2",
                params![payload, group.id],
            )?;
            require_rows(affected, &group.id)
        })?;
        warn_on_duplicates(affected, &group.id, "update");
        tracing::debug!(id = %group.id, elements = group.len(), "Updated dialogue group");

        self.refresh(refresh_cache)
    }

    pub fn delete(&self, id: &str, refresh_cache: bool) -> Result<()> {
        let mut conn = self.source.open()?;
        let affected = in_transaction(&mut conn, |tx| {
            let affected = tx.execute("DELETE FROM DialogueGroups WHERE ID = ?1", [id])?;
            require_rows(affected, id)
        })?;
        warn_on_duplicates(affected, id, "delete");
        tracing::debug!(id, "Deleted dialogue group");

        self.refresh(refresh_cache)
    }

    fn decode(&self, id: String, payload: Option<String>) -> Result<DialogueGroup> {
        let payload = payload.ok_or_else(|| {
            Error::Serialization(format!("dialogue group '{}' has no elements payload", id))
        })?;
        let elements = self.codec.deserialize(&payload).map_err(|err| {
            Error::Serialization(format!("dialogue group '{}': {}", id, err))
        })?;
        Ok(DialogueGroup { id, elements })
    }

    fn refresh(&self, refresh_cache: bool) -> Result<()> {
        if refresh_cache {
            self.initialize_cache()?;
        }
        Ok(())
    }
}

fn row_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM DialogueGroups WHERE ID = ?1)",
        [id],
        |row| row.get(0),
    )
}

fn require_rows(affected: usize, id: &str) -> Result<usize> {
    if affected == 0 {
        return Err(Error::not_found(Entity::Group, id));
    }
    Ok(affected)
}

fn warn_on_duplicates(affected: usize, id: &str, operation: &str) {
    if affected > 1 {
        tracing::warn!(id, affected, "{} touched duplicate dialogue group rows", operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::scratch_source;
    use crate::ErrorKind;

    fn store() -> (tempfile::TempDir, GroupStore) {
        let (dir, source) = scratch_source();
        (dir, GroupStore::new(source, ReloadStrategy::Swap))
    }

    fn raw_insert(store: &GroupStore, id: Option<&str>, payload: Option<&str>) {
        store
            .source
            .open()
            .unwrap()
            .execute(
                "INSERT INTO DialogueGroups (ID, Elements) VALUES (?1, ?2)",
                params![id, payload],
            )
            .unwrap();
    }

    #[test]
    fn test_insert_then_fetch_from_cache() {
        let (_dir, groups) = store();
        assert!(!groups.exists("intro").unwrap());

        groups
            .insert(&DialogueGroup::with_elements("intro", ["Hi"]), true)
            .unwrap();

        let cached = groups.fetch_from_cache("intro").unwrap();
        assert_eq!(cached.elements, vec!["Hi"]);
        assert_eq!(groups.fetch_from_store("intro").unwrap(), cached);
        assert!(groups.exists("intro").unwrap());
    }

    #[test]
    fn test_unchecked_insert_duplicates_row() {
        let (_dir, groups) = store();
        let intro = DialogueGroup::with_elements("intro", ["Hi"]);
        groups.insert(&intro, true).unwrap();

        groups.insert(&intro, false).unwrap();
        assert_eq!(groups.list().unwrap().len(), 2);

        let err = groups.initialize_cache().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CacheLoad);
        assert_eq!(groups.fetch_from_cache("intro").unwrap(), intro);
    }

    #[test]
    fn test_insert_new_rejects_existing_id() {
        let (_dir, groups) = store();
        let intro = DialogueGroup::with_elements("intro", ["Hi"]);
        groups.insert_new(&intro, true).unwrap();

        let err = groups
            .insert_new(&DialogueGroup::new("intro"), true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(groups.list().unwrap(), vec![intro]);
    }

    #[test]
    fn test_update_replaces_elements() {
        let (_dir, groups) = store();
        groups
            .insert(&DialogueGroup::with_elements("intro", ["Hi"]), true)
            .unwrap();

        let fetched = groups.fetch_from_cache("intro").unwrap();
        let edited = fetched.with_element("How are you?");
        assert_eq!(groups.fetch_from_cache("intro").unwrap().len(), 1);

        groups.update(&edited, true).unwrap();
        assert_eq!(
            groups.fetch_from_cache("intro").unwrap().elements,
            vec!["Hi", "How are you?"]
        );
    }

    #[test]
    fn test_update_and_delete_missing_group() {
        let (_dir, groups) = store();
        let err = groups.update(&DialogueGroup::new("ghost"), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = groups.delete("ghost", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_removes_from_store_and_cache() {
        let (_dir, groups) = store();
        groups.insert(&DialogueGroup::new("intro"), true).unwrap();
        groups.insert(&DialogueGroup::new("outro"), true).unwrap();
        assert_eq!(groups.cached_ids(), vec!["intro", "outro"]);

        groups.delete("intro", true).unwrap();
        assert!(groups.fetch_from_cache("intro").unwrap_err().is_not_found());
        assert!(groups.fetch_from_store("intro").unwrap_err().is_not_found());
        assert_eq!(groups.cached_ids(), vec!["outro"]);
    }

    #[test]
    fn test_delete_removes_duplicate_rows() {
        let (_dir, groups) = store();
        let intro = DialogueGroup::new("intro");
        groups.insert(&intro, false).unwrap();
        groups.insert(&intro, false).unwrap();

        groups.delete("intro", true).unwrap();
        assert!(groups.list().unwrap().is_empty());
        assert!(groups.cache().is_empty());
    }

    #[test]
    fn test_bad_payload_aborts_reload() {
        let (_dir, groups) = store();
        groups
            .insert(&DialogueGroup::with_elements("intro", ["Hi"]), true)
            .unwrap();
        raw_insert(&groups, Some("broken"), Some("not json"));

        let err = groups.initialize_cache().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(groups.fetch_from_cache("intro").is_ok());
        assert!(groups.fetch_from_cache("broken").is_err());

        let err = groups.fetch_from_store("broken").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_null_id_aborts_reload() {
        let (_dir, groups) = store();
        groups
            .insert(&DialogueGroup::with_elements("intro", ["Hi"]), true)
            .unwrap();
        let generation = groups.cache().generation();
        raw_insert(&groups, None, Some("[]"));

        let err = groups.initialize_cache().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CacheLoad);
        assert!(err.to_string().contains("NULL ID"));
        assert_eq!(groups.cache().generation(), generation);
        assert_eq!(groups.cached_ids(), vec!["intro"]);
    }

    #[test]
    fn test_null_payload_is_serialization_error() {
        let (_dir, groups) = store();
        raw_insert(&groups, Some("empty"), None);
        let err = groups.fetch_from_store("empty").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_payload_is_json_array() {
        let (_dir, groups) = store();
        groups
            .insert(&DialogueGroup::with_elements("intro", ["Hi", "there"]), false)
            .unwrap();

        let payload: String = groups
            .source
            .open()
            .unwrap()
            .query_row("SELECT Elements FROM DialogueGroups", [], |row| row.get(0))
            .unwrap();
        let parsed: Vec<String> = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed, vec!["Hi", "there"]);
    }

    #[test]
    fn test_fetch_from_store_returns_earliest_duplicate() {
        let (_dir, groups) = store();
        groups
            .insert(&DialogueGroup::with_elements("intro", ["first"]), false)
            .unwrap();
        groups
            .insert(&DialogueGroup::with_elements("intro", ["second"]), false)
            .unwrap();
        assert_eq!(groups.fetch_from_store("intro").unwrap().elements, vec!["first"]);
    }
}
