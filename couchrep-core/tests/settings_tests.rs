//! Settings file error messages, defaults and atomic-write safety.

use assert_fs::prelude::*;
use couchrep_core::{config, ConfigError, Namespace, Settings};
use predicates::prelude::predicate;

fn write_config(home: &assert_fs::TempDir, contents: &str) {
    home.child(".couchrep").create_dir_all().expect("mkdir");
    home.child(".couchrep/config.yaml")
        .write_str(contents)
        .expect("write");
}

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

#[test]
fn partial_file_fills_in_defaults() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, "hosts:\n  local: http://127.0.0.1:5984\n");

    let settings = config::load_at(home.path()).expect("load");
    assert_eq!(settings.namespace, Namespace::default());
    assert_eq!(settings.timeout_secs, None);
    assert_eq!(settings.resolve_host("local").expect("alias"), "http://127.0.0.1:5984");
}

#[test]
fn custom_namespace_is_read() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(
        &home,
        "namespace:\n  control_collection: ctl\n  reserved_prefix: \"$\"\ntimeout_secs: 5\n",
    );

    let settings = config::load_at(home.path()).expect("load");
    assert_eq!(settings.namespace.control_collection, "ctl");
    assert!(settings.namespace.is_reserved("$internal"));
    assert_eq!(settings.timeout_secs, Some(5));
}

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    write_config(&home, "hosts: [unclosed");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Save
// ---------------------------------------------------------------------------

#[test]
fn save_creates_file_and_cleans_tmp() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut settings = Settings::default();
    settings.add_host("local", "http://127.0.0.1:5984").expect("add");
    config::save_at(home.path(), &settings).expect("save");

    home.child(".couchrep/config.yaml")
        .assert(predicate::str::contains("http://127.0.0.1:5984"));
    home.child(".couchrep/config.yaml.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn add_host_replaces_existing_alias() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut settings = Settings::default();
    settings.add_host("local", "http://127.0.0.1:5984").expect("add");
    settings.add_host("local", "http://10.0.0.5:5984").expect("replace");
    config::save_at(home.path(), &settings).expect("save");

    let loaded = config::load_at(home.path()).expect("load");
    assert_eq!(loaded.hosts.len(), 1);
    assert_eq!(loaded.resolve_host("local").expect("alias"), "http://10.0.0.5:5984");
}
