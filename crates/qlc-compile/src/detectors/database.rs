//! Persistent cache of the detectors of every searched situation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use qlc_core::{ErrorInfo, QlcError, SchemaVersion};
use qlc_plaquette::{Plaquettes, SubTemplate3D};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::detectors::detector::Detectors;
use crate::detectors::engine::DetectorStore;

/// Schema of database files written by this crate.
pub const DATABASE_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Canonical description of a situation: the name of the plaquette in every
/// cell of every slice, rows first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DetectorDatabaseKey {
    rows: usize,
    cols: usize,
    slices: Vec<Vec<String>>,
}

impl DetectorDatabaseKey {
    /// Key of `subtemplate` filled with `plaquettes`, one collection per slice.
    pub fn new(subtemplate: &SubTemplate3D, plaquettes: &[Plaquettes]) -> Self {
        let (rows, cols) = subtemplate
            .slices()
            .first()
            .map_or((0, 0), |grid| (grid.rows(), grid.cols()));
        let slices = subtemplate
            .slices()
            .iter()
            .zip(plaquettes)
            .map(|(grid, collection)| {
                grid.iter()
                    .map(|(_, _, index)| collection.get(index).name().to_string())
                    .collect()
            })
            .collect();
        Self { rows, cols, slices }
    }

    /// Number of time slices.
    pub fn num_slices(&self) -> usize {
        self.slices.len()
    }

    /// Hex sha256 digest of the key.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.rows as u64).to_le_bytes());
        hasher.update((self.cols as u64).to_le_bytes());
        hasher.update((self.slices.len() as u64).to_le_bytes());
        for slice in &self.slices {
            for name in slice {
                hasher.update((name.len() as u64).to_le_bytes());
                hasher.update(name.as_bytes());
            }
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

/// One cached situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    /// Situation.
    pub key: DetectorDatabaseKey,
    /// Detectors owned by its centre.
    pub detectors: Detectors,
}

/// On-disk encoding of a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Compact `bincode`.
    Bincode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseFile {
    schema: SchemaVersion,
    entries: Vec<DatabaseEntry>,
}

#[derive(Debug, Default)]
struct DatabaseState {
    entries: BTreeMap<String, DatabaseEntry>,
    frozen: bool,
}

/// Thread-safe detector cache.
///
/// Entries are immutable once stored. A frozen database refuses new
/// situations.
#[derive(Debug, Default)]
pub struct DetectorDatabase {
    state: RwLock<DatabaseState>,
}

impl DetectorDatabase {
    /// Empty database.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_entries(entries: Vec<DatabaseEntry>) -> Result<Self, QlcError> {
        let database = Self::new();
        for entry in entries {
            database.add_situation(entry.key, entry.detectors)?;
        }
        Ok(database)
    }

    /// Number of situations.
    pub fn len(&self) -> usize {
        self.read(|state| state.entries.len())
    }

    /// Returns `true` without any situation.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when `key` is stored.
    pub fn contains(&self, key: &DetectorDatabaseKey) -> bool {
        self.get_detectors(key).is_some()
    }

    /// Detectors stored for `key`.
    pub fn get_detectors(&self, key: &DetectorDatabaseKey) -> Option<Detectors> {
        let digest = key.digest();
        self.read(|state| {
            state
                .entries
                .get(&digest)
                .filter(|entry| entry.key == *key)
                .map(|entry| entry.detectors.clone())
        })
    }

    /// Stores `detectors` for `key`.
    ///
    /// Storing the same value twice is a no-op; a different value for a
    /// stored key, or any new key while frozen, is an error.
    pub fn add_situation(
        &self,
        key: DetectorDatabaseKey,
        detectors: Detectors,
    ) -> Result<(), QlcError> {
        let digest = key.digest();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = state.entries.get(&digest) {
            if existing.key != key {
                return Err(QlcError::Database(
                    ErrorInfo::new("digest-collision", "two situations share one digest")
                        .with_context("digest", digest),
                ));
            }
            if existing.detectors != detectors {
                return Err(QlcError::Database(
                    ErrorInfo::new(
                        "detector-collision",
                        "a stored situation cannot be given different detectors",
                    )
                    .with_context("digest", digest),
                ));
            }
            return Ok(());
        }
        if state.frozen {
            return Err(QlcError::Database(
                ErrorInfo::new("frozen-database", "cannot add situations to a frozen database")
                    .with_context("digest", digest)
                    .with_hint("unfreeze the database first"),
            ));
        }
        state.entries.insert(digest, DatabaseEntry { key, detectors });
        Ok(())
    }

    /// Removes `key`, returning `true` when it was stored.
    pub fn remove(&self, key: &DetectorDatabaseKey) -> bool {
        let digest = key.digest();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.remove(&digest).is_some()
    }

    /// Refuses new situations from now on.
    pub fn freeze(&self) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).frozen = true;
    }

    /// Accepts new situations again.
    pub fn unfreeze(&self) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).frozen = false;
    }

    /// Returns `true` while frozen.
    pub fn is_frozen(&self) -> bool {
        self.read(|state| state.frozen)
    }

    /// Snapshot of the stored situations, by digest.
    pub fn entries(&self) -> Vec<DatabaseEntry> {
        self.read(|state| state.entries.values().cloned().collect())
    }

    /// Encodes the database.
    pub fn to_bytes(&self, format: DatabaseFormat) -> Result<Vec<u8>, QlcError> {
        let file = DatabaseFile {
            schema: DATABASE_SCHEMA,
            entries: self.entries(),
        };
        match format {
            DatabaseFormat::Json => serde_json::to_vec_pretty(&file).map_err(|err| {
                QlcError::Serde(ErrorInfo::new("database-serialize", err.to_string()))
            }),
            DatabaseFormat::Bincode => bincode::serialize(&file).map_err(|err| {
                QlcError::Serde(ErrorInfo::new("bincode-serialize", err.to_string()))
            }),
        }
    }

    /// Decodes a database, rejecting incompatible schemas.
    pub fn from_bytes(bytes: &[u8], format: DatabaseFormat) -> Result<Self, QlcError> {
        let file: DatabaseFile = match format {
            DatabaseFormat::Json => serde_json::from_slice(bytes).map_err(|err| {
                QlcError::Serde(ErrorInfo::new("database-parse", err.to_string()))
            })?,
            DatabaseFormat::Bincode => bincode::deserialize(bytes).map_err(|err| {
                QlcError::Serde(ErrorInfo::new("bincode-deserialize", err.to_string()))
            })?,
        };
        if !DATABASE_SCHEMA.is_compatible_with(&file.schema) {
            return Err(QlcError::Database(
                ErrorInfo::new("incompatible-schema", "database written with another schema")
                    .with_context("expected", DATABASE_SCHEMA.to_string())
                    .with_context("found", file.schema.to_string()),
            ));
        }
        Self::from_entries(file.entries)
    }

    /// Writes the database to `path`, creating parent directories.
    pub fn save(&self, path: &Path, format: DatabaseFormat) -> Result<(), QlcError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                QlcError::Serde(
                    ErrorInfo::new("database-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let bytes = self.to_bytes(format)?;
        fs::write(path, bytes).map_err(|err| {
            QlcError::Serde(
                ErrorInfo::new("database-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        info!(path = %path.display(), situations = self.len(), "saved detector database");
        Ok(())
    }

    /// Reads a database from `path`.
    pub fn load(path: &Path, format: DatabaseFormat) -> Result<Self, QlcError> {
        let bytes = fs::read(path).map_err(|err| {
            QlcError::Serde(
                ErrorInfo::new("database-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_bytes(&bytes, format).map_err(|err| match err {
            QlcError::Serde(info) => {
                QlcError::Serde(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Reads `path` when it exists, otherwise starts empty.
    ///
    /// A file written with an incompatible schema is ignored with a warning.
    pub fn load_or_default(path: &Path, format: DatabaseFormat) -> Result<Self, QlcError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        match Self::load(path, format) {
            Ok(database) => {
                info!(
                    path = %path.display(),
                    situations = database.len(),
                    "loaded detector database"
                );
                Ok(database)
            }
            Err(err) if err.code() == "incompatible-schema" => {
                warn!(path = %path.display(), error = %err, "ignoring detector database");
                Ok(Self::new())
            }
            Err(err) => Err(err),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&DatabaseState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }
}

impl DetectorStore for DetectorDatabase {
    fn get(&self, key: &DetectorDatabaseKey) -> Option<Detectors> {
        self.get_detectors(key)
    }

    fn put(&self, key: DetectorDatabaseKey, detectors: Detectors) -> Result<(), QlcError> {
        self.add_situation(key, detectors)
    }
}
