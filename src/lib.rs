//! # Dialogue Backend - authoring store for game narrative content
//!
//! Dialogue lines (integer keyed) and dialogue groups (caller named, ordered
//! elements) persisted in SQLite and mirrored in concurrent in-memory caches.
//!
//! Dialogue Backend provides:
//! - Transactional create/update/delete with rollback on failure
//! - Cache-hit lookups served from memory without I/O
//! - Full cache reloads with a swap or clear-then-load strategy
//! - A pluggable codec for persisting ordered element sequences

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod group;
pub mod line;
pub mod output;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use backend::{BackendStats, DialogueBackend};
pub use cache::{ReloadStrategy, ReloadableCache};
pub use codec::{JsonSequenceCodec, SequenceCodec};
pub use config::StoreConfig;
pub use group::DialogueGroup;
pub use line::DialogueLine;
pub use storage::{ConnectionSource, GroupStore, LineStore};

/// Result type alias for dialogue backend operations
pub type Result<T> = std::result::Result<T, Error>;

/// The persisted entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Line,
    Group,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Line => "dialogue line",
            Entity::Group => "dialogue group",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error types for dialogue backend operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No {entity} exists for ID '{key}'")]
    NotFound { entity: Entity, key: String },

    #[error("A {entity} already exists for ID '{key}'")]
    Conflict { entity: Entity, key: String },

    #[error("{operation} of {entity} '{key}' affected {affected} rows, expected exactly one")]
    RowCountViolation {
        entity: Entity,
        key: String,
        operation: &'static str,
        affected: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Cache load error: {0}")]
    CacheLoad(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Coarse classification of an [`Error`], stable across variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Serialization,
    Store,
    CacheLoad,
    InvariantViolation,
    Configuration,
}

impl Error {
    pub(crate) fn not_found(entity: Entity, key: impl std::fmt::Display) -> Self {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::RowCountViolation { .. } => ErrorKind::InvariantViolation,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Storage(_) => ErrorKind::Store,
            Error::CacheLoad(_) => ErrorKind::CacheLoad,
            Error::Config(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
