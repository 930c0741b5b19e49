//! Search and storage capabilities combined into a caching engine.

use std::fmt::Debug;
use std::sync::Arc;

use qlc_core::{ErrorInfo, QlcError};
use qlc_plaquette::{Plaquettes, SubTemplate3D};
use tracing::debug;

use crate::detectors::database::{DetectorDatabase, DetectorDatabaseKey};
use crate::detectors::detector::Detectors;
use crate::detectors::search::FlowDetectorSearch;

/// Computes the detectors owned by the centre of a situation.
///
/// Returned detectors use qubits relative to the centre syndrome qubit of the
/// last slice.
pub trait DetectorSearch: Debug + Send + Sync {
    /// Searches the detectors of `subtemplate` filled with `plaquettes`, one
    /// collection per slice.
    fn search(
        &self,
        subtemplate: &SubTemplate3D,
        plaquettes: &[Plaquettes],
    ) -> Result<Detectors, QlcError>;
}

/// Cache of previously searched situations.
pub trait DetectorStore: Debug + Send + Sync {
    /// Detectors stored for `key`.
    fn get(&self, key: &DetectorDatabaseKey) -> Option<Detectors>;

    /// Stores the detectors of a new situation.
    fn put(&self, key: DetectorDatabaseKey, detectors: Detectors) -> Result<(), QlcError>;
}

/// Cache-first detector computation.
#[derive(Debug, Clone)]
pub struct DetectorEngine {
    search: Arc<dyn DetectorSearch>,
    store: Arc<dyn DetectorStore>,
    only_use_database: bool,
}

impl DetectorEngine {
    /// Engine combining `search` and `store`.
    pub fn new(search: Arc<dyn DetectorSearch>, store: Arc<dyn DetectorStore>) -> Self {
        Self {
            search,
            store,
            only_use_database: false,
        }
    }

    /// Flow search backed by `database`.
    pub fn with_database(database: Arc<DetectorDatabase>) -> Self {
        Self::new(Arc::new(FlowDetectorSearch), database)
    }

    /// Flow search backed by a fresh in-memory database.
    pub fn in_memory() -> Self {
        Self::with_database(Arc::new(DetectorDatabase::new()))
    }

    /// When set, a situation missing from the store is an error instead of
    /// being searched.
    pub fn only_use_database(mut self, only: bool) -> Self {
        self.only_use_database = only;
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn DetectorStore> {
        &self.store
    }

    /// Detectors of one situation, from the store when known.
    pub fn detectors_for(
        &self,
        subtemplate: &SubTemplate3D,
        plaquettes: &[Plaquettes],
    ) -> Result<Detectors, QlcError> {
        let key = DetectorDatabaseKey::new(subtemplate, plaquettes);
        if let Some(detectors) = self.store.get(&key) {
            return Ok(detectors);
        }
        if self.only_use_database {
            return Err(QlcError::Database(
                ErrorInfo::new(
                    "missing-situation",
                    "situation not found and searching is disabled",
                )
                .with_context("digest", key.digest())
                .with_hint("run once with only_use_database disabled to fill the database"),
            ));
        }
        let detectors = self.search.search(subtemplate, plaquettes)?;
        debug!(digest = %key.digest(), detectors = detectors.len(), "caching new situation");
        self.store.put(key, detectors.clone())?;
        Ok(detectors)
    }
}
