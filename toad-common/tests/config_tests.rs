//! Tests for config file resolution and graceful degradation
//!
//! Tests that manipulate TOAD_CONFIG are marked with #[serial] so they do not
//! race each other on the process environment.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use toad_common::config::{ConfigResolver, TomlConfig, CONFIG_ENV_VAR};
use toad_common::Error;

#[test]
#[serial]
fn test_cli_path_has_priority_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/toad-env-config.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/toad-cli-config.toml")));
    assert_eq!(
        resolver.resolve_path(),
        Some(PathBuf::from("/tmp/toad-cli-config.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/toad-env-config.toml");

    let resolver = ConfigResolver::new(None);
    assert_eq!(
        resolver.resolve_path(),
        Some(PathBuf::from("/tmp/toad-env-config.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let config = ConfigResolver::new(Some(missing)).load().unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_load_from_env_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[scan]\nraw_extension = \"ima\"\necho_marker = \"te_\"\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let config = ConfigResolver::new(None).load().unwrap();
    assert_eq!(config.scan.raw_extension, "ima");
    assert_eq!(config.scan.echo_marker, "te_");
    assert_eq!(config.logging.level, "debug");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "scan = [").unwrap();

    let result = ConfigResolver::new(Some(path)).load();
    assert!(matches!(result, Err(Error::Config(_))));
}
