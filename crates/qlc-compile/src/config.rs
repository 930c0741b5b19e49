//! YAML-configurable compilation settings.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use qlc_core::{ErrorInfo, QlcError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::detectors::{DatabaseFormat, DetectorDatabase, DetectorEngine};

/// Environment variable overriding the default detector database location.
pub const DATABASE_PATH_ENV: &str = "QLC_DETECTOR_DATABASE_PATH";

/// Settings of one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Number of past rounds searched for detectors.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Radius of the neighbourhood of each searched plaquette.
    #[serde(default = "default_manhattan_radius")]
    pub manhattan_radius: usize,
    /// Emit a `POLYGON` per plaquette for drawing tools.
    #[serde(default)]
    pub add_polygons: bool,
    /// Worker threads used by [`crate::batch::compile_many`]; 0 lets rayon
    /// decide.
    #[serde(default)]
    pub threads: usize,
    /// Detector cache.
    #[serde(default)]
    pub database: DatabaseConfig,
}

fn default_lookback() -> usize {
    2
}

fn default_manhattan_radius() -> usize {
    2
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            manhattan_radius: default_manhattan_radius(),
            add_polygons: false,
            threads: 0,
            database: DatabaseConfig::default(),
        }
    }
}

impl CompileConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, QlcError> {
        let config: Self = serde_yaml::from_str(contents)
            .map_err(|err| QlcError::Serde(ErrorInfo::new("config-parse", err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, QlcError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            QlcError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            QlcError::Serde(info) => {
                QlcError::Serde(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Rejects a lookback shorter than one round.
    pub fn validate(&self) -> Result<(), QlcError> {
        if self.lookback < 1 {
            return Err(QlcError::Construction(
                ErrorInfo::new("invalid-lookback", "the lookback must cover at least one round")
                    .with_context("lookback", self.lookback.to_string()),
            ));
        }
        Ok(())
    }

    /// Detector engine over the configured database, and the handle used to
    /// persist that database afterwards.
    pub fn engine(&self) -> Result<(DetectorEngine, PersistedDatabase), QlcError> {
        let handle = self.database.open()?;
        let engine = DetectorEngine::with_database(Arc::clone(handle.database()))
            .only_use_database(self.database.only_use_database);
        Ok((engine, handle))
    }
}

/// Location and behaviour of the detector database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit file location.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// On-disk encoding.
    #[serde(default)]
    pub format: DatabaseFormat,
    /// Fail on unknown situations instead of searching them.
    #[serde(default)]
    pub only_use_database: bool,
    /// Load the database before compiling and save it afterwards.
    #[serde(default)]
    pub persist: bool,
}

impl DatabaseConfig {
    /// File used for persistence.
    ///
    /// In order: the explicit `path`, the [`DATABASE_PATH_ENV`] variable, then
    /// the user data directory.
    pub fn resolve_path(&self) -> Result<PathBuf, QlcError> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Some(path) = env::var_os(DATABASE_PATH_ENV).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("org", "qlc", "qlc").ok_or_else(|| {
            QlcError::Database(
                ErrorInfo::new("database-path", "no home directory to store the detector database")
                    .with_hint(format!("set {DATABASE_PATH_ENV} or database.path")),
            )
        })?;
        let file = match self.format {
            DatabaseFormat::Json => "detector_database.json",
            DatabaseFormat::Bincode => "detector_database.bin",
        };
        Ok(dirs.data_dir().join(file))
    }

    /// Database to compile with: loaded from disk when persisting, empty
    /// otherwise.
    ///
    /// The file location is resolved here once; saving through the returned
    /// handle writes back to that same file.
    pub fn open(&self) -> Result<PersistedDatabase, QlcError> {
        if !self.persist {
            return Ok(PersistedDatabase {
                database: Arc::new(DetectorDatabase::new()),
                path: None,
                format: self.format,
            });
        }
        let path = self.resolve_path()?;
        info!(path = %path.display(), "opening detector database");
        let database = DetectorDatabase::load_or_default(&path, self.format)?;
        Ok(PersistedDatabase {
            database: Arc::new(database),
            path: Some(path),
            format: self.format,
        })
    }
}

/// Detector database opened from a [`DatabaseConfig`].
#[derive(Debug, Clone)]
pub struct PersistedDatabase {
    database: Arc<DetectorDatabase>,
    path: Option<PathBuf>,
    format: DatabaseFormat,
}

impl PersistedDatabase {
    /// Shared database, as handed to the detector engine.
    pub fn database(&self) -> &Arc<DetectorDatabase> {
        &self.database
    }

    /// File the database was loaded from, `None` when not persisting.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the database back to the file it was opened from.
    pub fn save(&self) -> Result<(), QlcError> {
        match &self.path {
            Some(path) => self.database.save(path, self.format),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = CompileConfig::from_yaml_str("manhattan_radius: 3\n").unwrap();
        assert_eq!(config.lookback, 2);
        assert_eq!(config.manhattan_radius, 3);
        assert!(!config.database.persist);
        assert_eq!(config.database.format, DatabaseFormat::Json);
    }

    #[test]
    fn zero_lookback_is_rejected() {
        let err = CompileConfig::from_yaml_str("lookback: 0\n").unwrap_err();
        assert!(matches!(err, QlcError::Construction(_)));
        assert_eq!(err.code(), "invalid-lookback");
    }

    #[test]
    fn explicit_path_wins() {
        let config = DatabaseConfig {
            path: Some(PathBuf::from("/tmp/db.json")),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.resolve_path().unwrap(), PathBuf::from("/tmp/db.json"));
    }

    #[test]
    fn transient_databases_have_no_path() {
        let handle = DatabaseConfig::default().open().unwrap();
        assert!(handle.path().is_none());
        assert!(handle.database().is_empty());
        handle.save().unwrap();
    }
}
