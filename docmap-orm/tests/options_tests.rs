use docmap_orm::{OrmError, Options};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Defaults & validation ────────────────────────────────────────

#[test]
fn new_uses_defaults() {
    let options = Options::new("library");
    assert_eq!(options.db_name, "library");
    assert_eq!(options.client_url, "mongodb://localhost:27017");
    assert!(options.entities_dirs.is_empty());
    assert!(options.base_dir.is_none());
    assert!(options.logger.is_none());
    assert!(options.validate().is_ok());
}

#[test]
fn empty_db_name_is_rejected() {
    let err = Options::new("  ").validate().unwrap_err();
    assert!(matches!(err, OrmError::Config(_)));
    assert!(err.to_string().contains("db_name"));
}

#[test]
fn empty_client_url_is_rejected() {
    let err = Options::new("library")
        .with_client_url("")
        .validate()
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(_)));
}

#[test]
fn base_dir_defaults_to_current_dir() {
    let options = Options::new("library");
    assert_eq!(
        options.resolved_base_dir().unwrap(),
        std::env::current_dir().unwrap()
    );

    let options = options.with_base_dir("/srv/app");
    assert_eq!(options.resolved_base_dir().unwrap(), PathBuf::from("/srv/app"));
}

// ── Logger ───────────────────────────────────────────────────────

#[test]
fn log_without_logger_is_a_no_op() {
    Options::new("library").log("nobody listens");
}

#[test]
fn log_forwards_to_logger() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let options = Options::new("library")
        .with_logger(move |msg| sink.lock().unwrap().push(msg.to_string()));

    options.log("hello");
    assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);

    let debug = format!("{options:?}");
    assert!(debug.contains("logger: true"));
}

// ── TOML loading ─────────────────────────────────────────────────

#[test]
fn load_from_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docmap.toml");
    std::fs::write(
        &path,
        r#"
db_name = "library"
entities_dirs = ["entities", "more"]
base_dir = "/srv/app"
client_url = "mongodb://db:27017"
"#,
    )
    .unwrap();

    let options = Options::load_from(&path).unwrap();
    assert_eq!(options.db_name, "library");
    assert_eq!(
        options.entities_dirs,
        vec![PathBuf::from("entities"), PathBuf::from("more")]
    );
    assert_eq!(options.base_dir, Some(PathBuf::from("/srv/app")));
    assert_eq!(options.client_url, "mongodb://db:27017");
}

#[test]
fn load_from_accepts_camel_case_and_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docmap.toml");
    std::fs::write(&path, "dbName = \"library\"\nentitiesDirs = [\"entities\"]\n").unwrap();

    let options = Options::load_from(&path).unwrap();
    assert_eq!(options.db_name, "library");
    assert_eq!(options.entities_dirs, vec![PathBuf::from("entities")]);
    assert_eq!(options.client_url, "mongodb://localhost:27017");
    assert!(options.base_dir.is_none());
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Options::load_from(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, OrmError::Io(_)));
}

#[test]
fn load_from_invalid_toml_is_toml_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docmap.toml");
    std::fs::write(&path, "entities_dirs = [\"x\"]\n").unwrap();

    let err = Options::load_from(&path).unwrap_err();
    assert!(matches!(err, OrmError::Toml(_)));
}
