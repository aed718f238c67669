//! Config file loading, lookup, and error-message tests.

use std::fs;

use distsync_core::{config, ConfigError, ConfigFile, Zone};
use tempfile::TempDir;

const FULL_YAML: &str = "\
publicPath: https://cdn.example.com
accessKey: ak-123
secretKey: sk-456
bucket: assets
zone: Zone_z1
prefix: site
clear: true
cover: true
";

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

#[test]
fn full_yaml_validates() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("distsync.yaml");
    fs::write(&path, FULL_YAML).expect("write");

    let config = ConfigFile::load(&path).expect("load").validate().expect("validate");
    assert_eq!(config.public_path(), "https://cdn.example.com");
    assert_eq!(config.bucket(), "assets");
    assert_eq!(config.zone(), Zone::Z1);
    assert_eq!(config.prefix(), "site");
    assert!(config.clear());
    assert!(config.cover());
}

#[test]
fn missing_field_in_file_fails_validation() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("distsync.yaml");
    fs::write(&path, FULL_YAML.replace("bucket: assets\n", "")).expect("write");

    let err = ConfigFile::load(&path).expect("load").validate().unwrap_err();
    assert!(matches!(err, ConfigError::MissingField("bucket")), "got: {err}");
    assert!(err.to_string().contains("bucket"));
}

#[test]
fn unknown_zone_in_file_fails_validation() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("distsync.yaml");
    fs::write(&path, FULL_YAML.replace("Zone_z1", "Zone_moon")).expect("write");

    let err = ConfigFile::load(&path).expect("load").validate().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownZone(_)), "got: {err}");
}

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("distsync.yaml");
    fs::write(&path, b"publicPath: [unclosed\n  - : :").expect("write");

    let err = ConfigFile::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("distsync.yaml"));
}

#[test]
fn missing_file_returns_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = ConfigFile::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Lookup
// ---------------------------------------------------------------------------

#[test]
fn locate_prefers_explicit_path() {
    let cwd = TempDir::new().expect("cwd");
    fs::write(cwd.path().join("distsync.yaml"), FULL_YAML).expect("write");
    let explicit = cwd.path().join("other.yaml");

    let found = config::locate_at(Some(&explicit), cwd.path(), None).expect("locate");
    assert_eq!(found, explicit);
}

#[test]
fn locate_falls_back_to_config_dir() {
    let cwd = TempDir::new().expect("cwd");
    let config_dir = TempDir::new().expect("config dir");
    let user_file = config_dir.path().join("distsync").join("config.yaml");
    fs::create_dir_all(user_file.parent().expect("parent")).expect("mkdir");
    fs::write(&user_file, FULL_YAML).expect("write");

    let found = config::locate_at(None, cwd.path(), Some(config_dir.path())).expect("locate");
    assert_eq!(found, user_file);
}

#[test]
fn locate_reports_every_searched_path() {
    let cwd = TempDir::new().expect("cwd");
    let config_dir = TempDir::new().expect("config dir");

    let err = config::locate_at(None, cwd.path(), Some(config_dir.path())).unwrap_err();
    match &err {
        ConfigError::NotFound { searched } => assert_eq!(searched.len(), 2),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(err.to_string().contains("distsync.yaml"));
}
