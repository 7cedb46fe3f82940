//! Reloadable in-memory cache
//!
//! Each cache mirrors one table. Entries are only replaced wholesale by a
//! reload; reads never touch the store.

use std::borrow::Borrow;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How a full reload publishes the new population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadStrategy {
    /// Build the new population separately, publish it only after the scan succeeds.
    #[default]
    Swap,
    /// Clear the live cache, then fill it while scanning. Readers may observe
    /// an empty or partial cache mid-reload, and a failed reload leaves it partial.
    Clear,
}

impl ReloadStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadStrategy::Swap => "swap",
            ReloadStrategy::Clear => "clear",
        }
    }
}

impl std::str::FromStr for ReloadStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "swap" => Ok(ReloadStrategy::Swap),
            "clear" | "clear-then-load" => Ok(ReloadStrategy::Clear),
            _ => Err(Error::Config(format!("Unknown reload strategy: {}", s))),
        }
    }
}

impl std::fmt::Display for ReloadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concurrent key/value cache that is repopulated by full reloads.
pub struct ReloadableCache<K, V> {
    name: &'static str,
    strategy: ReloadStrategy,
    entries: RwLock<Arc<DashMap<K, V>>>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl<K, V> ReloadableCache<K, V>
where
    K: Eq + Hash + Clone + Display,
    V: Clone,
{
    pub fn new(name: &'static str, strategy: ReloadStrategy) -> Self {
        Self {
            name,
            strategy,
            entries: RwLock::new(Arc::new(DashMap::new())),
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn strategy(&self) -> ReloadStrategy {
        self.strategy
    }

    /// Number of completed reloads
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn current(&self) -> Arc<DashMap<K, V>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up a key without touching the store
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.current().get(key).map(|entry| entry.value().clone())
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.current().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    pub fn keys(&self) -> Vec<K> {
        self.current().iter().map(|entry| entry.key().clone()).collect()
    }

    /// Replace the cache contents with the rows produced by `scan`.
    ///
    /// Reloads of the same cache are serialized, so the published population
    /// always comes from a single scan. A key seen twice fails the reload with
    /// [`Error::CacheLoad`].
    pub fn reload<F>(&self, scan: F) -> Result<usize>
    where
        F: FnOnce() -> Result<Vec<(K, V)>>,
    {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let count = match self.strategy {
            ReloadStrategy::Swap => {
                let rows = scan()?;
                let fresh = DashMap::with_capacity(rows.len());
                self.fill(&fresh, rows)?;
                let count = fresh.len();
                *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);
                count
            }
            ReloadStrategy::Clear => {
                let live = self.current();
                live.clear();
                let rows = scan()?;
                self.fill(&live, rows)?;
                live.len()
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            cache = self.name,
            entries = count,
            generation,
            strategy = self.strategy.as_str(),
            "cache reloaded"
        );
        Ok(count)
    }

    fn fill(&self, target: &DashMap<K, V>, rows: Vec<(K, V)>) -> Result<()> {
        for (key, value) in rows {
            if target.contains_key(&key) {
                return Err(Error::CacheLoad(format!(
                    "duplicate key '{}' while loading the {} cache",
                    key, self.name
                )));
            }
            target.insert(key, value);
        }
        Ok(())
    }
}
