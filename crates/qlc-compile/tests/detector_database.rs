use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use qlc_compile::detectors::Detectors;
use qlc_compile::{
    compute_detectors_for_fixed_radius, DatabaseFormat, DetectorDatabase, DetectorEngine,
    DetectorSearch, FlowDetectorSearch,
};
use qlc_core::{Basis, QlcError};
use qlc_plaquette::{
    surface_code_plaquettes, Plaquettes, RectangularTemplate, RoundKind, SubTemplate3D,
};

#[derive(Debug, Default)]
struct CountingSearch {
    calls: AtomicUsize,
}

impl DetectorSearch for CountingSearch {
    fn search(
        &self,
        subtemplate: &SubTemplate3D,
        plaquettes: &[Plaquettes],
    ) -> Result<Detectors, QlcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        FlowDetectorSearch.search(subtemplate, plaquettes)
    }
}

fn history() -> (Vec<RectangularTemplate>, Vec<Plaquettes>) {
    let init = surface_code_plaquettes(
        RectangularTemplate::Qubit,
        Basis::Z,
        RoundKind::Initialization(Basis::Z),
    )
    .expect("init");
    let memory = surface_code_plaquettes(RectangularTemplate::Qubit, Basis::Z, RoundKind::Memory)
        .expect("memory");
    (
        vec![RectangularTemplate::Qubit, RectangularTemplate::Qubit],
        vec![init, memory],
    )
}

fn compute(engine: &DetectorEngine) -> Result<Detectors, QlcError> {
    let (templates, plaquettes) = history();
    compute_detectors_for_fixed_radius(&templates, 2, &plaquettes, 2, engine)
}

#[test]
fn second_computation_is_served_from_the_database() {
    let search = Arc::new(CountingSearch::default());
    let database = Arc::new(DetectorDatabase::new());
    let engine = DetectorEngine::new(search.clone(), database.clone());

    let first = compute(&engine).unwrap();
    let searches = search.calls.load(Ordering::SeqCst);
    assert!(!first.is_empty());
    assert!(searches > 0);
    assert_eq!(database.len(), searches);

    let second = compute(&engine).unwrap();
    assert_eq!(first, second);
    assert_eq!(search.calls.load(Ordering::SeqCst), searches);
}

#[test]
fn database_only_mode_fails_on_unknown_situations() {
    let engine = DetectorEngine::in_memory().only_use_database(true);
    let err = compute(&engine).unwrap_err();
    assert!(matches!(err, QlcError::Database(_)));
    assert_eq!(err.code(), "missing-situation");
}

#[test]
fn frozen_database_refuses_new_situations() {
    let database = Arc::new(DetectorDatabase::new());
    database.freeze();
    let engine = DetectorEngine::with_database(database.clone());
    let err = compute(&engine).unwrap_err();
    assert_eq!(err.code(), "frozen-database");

    database.unfreeze();
    assert!(compute(&engine).is_ok());
    assert!(!database.is_empty());
}

#[test]
fn saved_databases_answer_without_searching() {
    for format in [DatabaseFormat::Json, DatabaseFormat::Bincode] {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("detectors.db");

        let database = Arc::new(DetectorDatabase::new());
        let expected = compute(&DetectorEngine::with_database(database.clone())).unwrap();
        database.save(&path, format).unwrap();

        let loaded = Arc::new(DetectorDatabase::load(&path, format).unwrap());
        assert_eq!(loaded.len(), database.len());
        let search = Arc::new(CountingSearch::default());
        let engine = DetectorEngine::new(search.clone(), loaded).only_use_database(true);
        assert_eq!(compute(&engine).unwrap(), expected);
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn missing_or_incompatible_files_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(DetectorDatabase::load_or_default(&missing, DatabaseFormat::Json)
        .unwrap()
        .is_empty());

    let future = dir.path().join("future.json");
    std::fs::write(
        &future,
        r#"{"schema": {"major": 2, "minor": 0, "patch": 0}, "entries": []}"#,
    )
    .unwrap();
    let err = DetectorDatabase::load(&future, DatabaseFormat::Json).unwrap_err();
    assert_eq!(err.code(), "incompatible-schema");
    assert!(DetectorDatabase::load_or_default(&future, DatabaseFormat::Json)
        .unwrap()
        .is_empty());

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json").unwrap();
    let err = DetectorDatabase::load_or_default(&garbage, DatabaseFormat::Json).unwrap_err();
    assert!(matches!(err, QlcError::Serde(_)));
}
