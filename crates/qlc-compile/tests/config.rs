use std::path::PathBuf;
use std::sync::Mutex;

use qlc_compile::{CompileConfig, DatabaseConfig, DatabaseFormat, DATABASE_PATH_ENV};
use qlc_core::QlcError;

// Tests touching the process environment run one at a time.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn full_document_round_trips_through_yaml() {
    let yaml = r#"
lookback: 3
manhattan_radius: 1
add_polygons: true
threads: 2
database:
  path: /tmp/qlc/detectors.bin
  format: bincode
  only_use_database: true
  persist: true
"#;
    let config = CompileConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.lookback, 3);
    assert_eq!(config.manhattan_radius, 1);
    assert!(config.add_polygons);
    assert_eq!(config.threads, 2);
    assert_eq!(config.database.format, DatabaseFormat::Bincode);
    assert_eq!(
        config.database.resolve_path().unwrap(),
        PathBuf::from("/tmp/qlc/detectors.bin")
    );

    let rendered = serde_yaml::to_string(&config).unwrap();
    assert_eq!(CompileConfig::from_yaml_str(&rendered).unwrap(), config);
}

#[test]
fn configuration_files_are_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compile.yaml");
    std::fs::write(&path, "lookback: 4\n").unwrap();
    assert_eq!(CompileConfig::from_path(&path).unwrap().lookback, 4);

    let err = CompileConfig::from_path(&dir.path().join("missing.yaml")).unwrap_err();
    assert_eq!(err.code(), "config-read");

    std::fs::write(&path, "lookback: [\n").unwrap();
    let err = CompileConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, QlcError::Serde(_)));
    assert_eq!(err.code(), "config-parse");
}

#[test]
fn environment_overrides_the_default_location() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("from-env.json");
    std::env::set_var(DATABASE_PATH_ENV, &target);
    let resolved = DatabaseConfig::default().resolve_path();
    std::env::remove_var(DATABASE_PATH_ENV);
    assert_eq!(resolved.unwrap(), target);
}

#[test]
fn persisted_database_survives_between_engines() {
    let dir = tempfile::tempdir().unwrap();
    let config = CompileConfig {
        database: DatabaseConfig {
            path: Some(dir.path().join("db.json")),
            persist: true,
            ..DatabaseConfig::default()
        },
        ..CompileConfig::default()
    };
    let (_, handle) = config.engine().unwrap();
    assert!(handle.database().is_empty());
    handle.save().unwrap();
    assert!(dir.path().join("db.json").exists());
    let (_, reopened) = config.engine().unwrap();
    assert!(reopened.database().is_empty());
}

#[test]
fn saving_writes_where_the_database_was_opened() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let opened = dir.path().join("opened.json");
    let moved = dir.path().join("moved.json");
    let config = DatabaseConfig {
        persist: true,
        ..DatabaseConfig::default()
    };

    std::env::set_var(DATABASE_PATH_ENV, &opened);
    let handle = config.open();
    std::env::set_var(DATABASE_PATH_ENV, &moved);
    let saved = handle.and_then(|handle| {
        handle.save()?;
        Ok(handle)
    });
    std::env::remove_var(DATABASE_PATH_ENV);

    let handle = saved.unwrap();
    assert_eq!(handle.path(), Some(opened.as_path()));
    assert!(opened.exists());
    assert!(!moved.exists());
}
