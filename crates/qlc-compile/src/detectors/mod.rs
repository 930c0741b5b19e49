//! Detector computation: per-situation flow search, caching database and the
//! lookback window used while walking a layer tree.

pub mod compute;
pub mod database;
pub mod detector;
pub mod engine;
pub mod flows;
pub mod lookback;
pub mod search;

pub use compute::compute_detectors_for_fixed_radius;
pub use database::{
    DatabaseEntry, DatabaseFormat, DetectorDatabase, DetectorDatabaseKey, DATABASE_SCHEMA,
};
pub use detector::{Detector, Detectors, Measurement};
pub use engine::{DetectorEngine, DetectorSearch, DetectorStore};
pub use flows::{analyse_circuit, CircuitFlows, FlowAnalysis, MeasurementEvent};
pub use lookback::{LookbackEntry, LookbackStack, LookbackWindow};
pub use search::FlowDetectorSearch;
