use qlc_core::errors::{ErrorInfo, QlcError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("position", "(0,0)")
        .with_context("reason", "example")
}

#[test]
fn construction_error_surface() {
    let err = QlcError::Construction(sample_info("shape-mismatch", "layers disagree"));
    assert_eq!(err.info().code, "shape-mismatch");
    assert!(err.info().context.contains_key("position"));
}

#[test]
fn precondition_error_surface() {
    let err = QlcError::Precondition(sample_info("missing-circuit", "no circuit"));
    assert_eq!(err.code(), "missing-circuit");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn unsupported_error_surface() {
    let err = QlcError::Unsupported(sample_info("layout-spatial-trim", "cannot trim"));
    assert_eq!(err.code(), "layout-spatial-trim");
}

#[test]
fn lookback_error_surface() {
    let err = QlcError::Lookback(sample_info("measurement-outside-window", "too shallow"));
    assert_eq!(err.code(), "measurement-outside-window");
}

#[test]
fn database_error_surface() {
    let err = QlcError::Database(sample_info("conflicting-entry", "collision"));
    assert_eq!(err.code(), "conflicting-entry");
}

#[test]
fn display_includes_context_and_hint() {
    let err = QlcError::Serde(sample_info("db-read", "unreadable").with_hint("delete the file"));
    let rendered = err.to_string();
    assert!(rendered.starts_with("serde error: unreadable (code: db-read)"));
    assert!(rendered.contains("position=(0,0), reason=example"));
    assert!(rendered.ends_with("hint: delete the file"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = QlcError::Lookback(ErrorInfo::new("L001", "outside window"));
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["family"], "Lookback");
    assert_eq!(json["detail"]["code"], "L001");
    let restored: QlcError = serde_json::from_value(json).expect("deserialize");
    assert_eq!(restored, err);
}
