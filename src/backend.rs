//! Backend facade owning the line and group stores
//!
//! A [`DialogueBackend`] is built from an explicit [`StoreConfig`] and shared
//! between callers (wrap it in an `Arc` for threads). There is no global state.

use crate::codec::JsonSequenceCodec;
use crate::config::StoreConfig;
use crate::storage::{schema, ConnectionSource, GroupStore, LineStore};
use crate::Result;

pub struct DialogueBackend {
    config: StoreConfig,
    source: ConnectionSource,
    lines: LineStore,
    groups: GroupStore,
}

impl DialogueBackend {
    /// Build the stores for `config`, creating missing tables if configured to.
    ///
    /// Caches start empty; call [`initialize_caches`](Self::initialize_caches)
    /// to populate them.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let source = ConnectionSource::from_config(&config);
        if config.create_schema {
            schema::ensure_schema(&source.open()?)?;
        }

        let lines = LineStore::new(source.clone(), config.reload_strategy);
        let groups = GroupStore::with_codec(
            source.clone(),
            config.reload_strategy,
            JsonSequenceCodec::new(config.pretty_elements),
        );

        tracing::debug!(
            "Opened dialogue backend at {} (reload: {})",
            source.location().display(),
            config.reload_strategy
        );
        Ok(Self {
            config,
            source,
            lines,
            groups,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn source(&self) -> &ConnectionSource {
        &self.source
    }

    pub fn lines(&self) -> &LineStore {
        &self.lines
    }

    pub fn groups(&self) -> &GroupStore {
        &self.groups
    }

    /// Reload both caches, returning the number of lines and groups loaded
    pub fn initialize_caches(&self) -> Result<(usize, usize)> {
        let lines = self.lines.initialize_cache()?;
        let groups = self.groups.initialize_cache()?;
        Ok((lines, groups))
    }

    /// Row counts in the store alongside cache sizes
    pub fn stats(&self) -> Result<BackendStats> {
        let conn = self.source.open()?;
        let count = |table: &str| -> Result<usize> {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(count as usize)
        };

        Ok(BackendStats {
            stored_lines: count(schema::LINES_TABLE)?,
            stored_groups: count(schema::GROUPS_TABLE)?,
            cached_lines: self.lines.cache().len(),
            cached_groups: self.groups.cache().len(),
            line_generation: self.lines.cache().generation(),
            group_generation: self.groups.cache().generation(),
        })
    }
}

/// Store and cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStats {
    pub stored_lines: usize,
    pub stored_groups: usize,
    pub cached_lines: usize,
    pub cached_groups: usize,
    pub line_generation: u64,
    pub group_generation: u64,
}

impl std::fmt::Display for BackendStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dialogue Statistics:")?;
        writeln!(f, "  Lines: {} stored, {} cached", self.stored_lines, self.cached_lines)?;
        writeln!(f, "  Groups: {} stored, {} cached", self.stored_groups, self.cached_groups)?;
        writeln!(
            f,
            "  Reloads: {} lines, {} groups",
            self.line_generation, self.group_generation
        )
    }
}
