//! Configuration loading tests

use acl_engine::config::{LogFormat, load_config_from_str};
use acl_engine::error::ConfigError;

const MINIMAL_CONFIG: &str = r#"
[engine]
debug = false
"#;

const FULL_CONFIG: &str = r#"
[engine]
debug = true

[logging]
level = "trace"
format = "json"

[directory.groups]
staff = ["alice", "bob"]
admins = ["alice"]
"calendar-editors" = ["carol"]
"#;

#[test]
fn test_minimal_config() {
    let config = load_config_from_str(MINIMAL_CONFIG).unwrap();

    assert!(!config.engine.debug);
    assert_eq!(config.logging.level, "info"); // Default level
    assert_eq!(config.logging.format, LogFormat::Pretty); // Default format
    assert!(config.directory.groups.is_empty());
}

#[test]
fn test_full_config() {
    let config = load_config_from_str(FULL_CONFIG).unwrap();

    // Engine
    assert!(config.engine.debug);

    // Logging
    assert_eq!(config.logging.level, "trace");
    assert_eq!(config.logging.format, LogFormat::Json);

    // Directory
    assert_eq!(config.directory.groups.len(), 3);
    assert_eq!(config.directory.groups["staff"], vec!["alice", "bob"]);
    assert_eq!(config.directory.groups["calendar-editors"], vec!["carol"]);
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = load_config_from_str("").unwrap();
    assert!(!config.engine.debug);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_log_format() {
    let config_str = r#"
[logging]
format = "xml"
"#;

    let result = load_config_from_str(config_str);
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_invalid_log_level() {
    let config_str = r#"
[logging]
level = "loud"
"#;

    let result = load_config_from_str(config_str);
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_empty_group_member() {
    let config_str = r#"
[directory.groups]
staff = ["alice", "  "]
"#;

    let result = load_config_from_str(config_str);
    assert!(result.is_err());
}

#[test]
fn test_missing_explicit_file() {
    use acl_engine::config::load_config;

    let result = load_config(Some("/nonexistent/acl-engine.toml"));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial_test::serial]
fn test_load_from_file() {
    use acl_engine::config::load_config;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    fs::write(&config_path, FULL_CONFIG).unwrap();

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();

    assert!(config.engine.debug);
    assert_eq!(config.directory.groups["admins"], vec!["alice"]);
}

#[test]
#[serial_test::serial]
fn test_env_var_overrides_file() {
    use acl_engine::config::load_config;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    // Create a temporary config file with debug off
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    let config_content = r#"
[engine]
debug = false

[logging]
level = "info"
"#;
    fs::write(&config_path, config_content).unwrap();

    unsafe {
        env::set_var("ACL_ENGINE__ENGINE__DEBUG", "true");
        env::set_var("ACL_ENGINE__LOGGING__LEVEL", "debug");
    }

    let config = load_config(Some(config_path.to_str().unwrap())).unwrap();

    // Environment wins over the file
    assert!(config.engine.debug);
    assert_eq!(config.logging.level, "debug");

    // Cleanup
    unsafe {
        env::remove_var("ACL_ENGINE__ENGINE__DEBUG");
        env::remove_var("ACL_ENGINE__LOGGING__LEVEL");
    }
}

#[test]
#[serial_test::serial]
fn test_invalid_env_value_rejected() {
    use acl_engine::config::load_config;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("test-config.toml");
    fs::write(&config_path, MINIMAL_CONFIG).unwrap();

    unsafe {
        env::set_var("ACL_ENGINE__LOGGING__LEVEL", "chatty");
    }

    let result = load_config(Some(config_path.to_str().unwrap()));

    unsafe {
        env::remove_var("ACL_ENGINE__LOGGING__LEVEL");
    }

    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}
