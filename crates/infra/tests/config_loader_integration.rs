//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading client configuration from files.

use std::io::Write;

use tallyline_domain::{ClientConfig, LimitConfig, TallyError};
use tallyline_infra::{config, ApiClient};
use tempfile::NamedTempFile;

fn config_file(extension: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("tallyline")
        .suffix(extension)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let file = config_file(
        ".json",
        r#"{
            "base_url": "https://sandbox-quickbooks.api.intuit.com",
            "minor_version": "70",
            "timeout_secs": 12,
            "request_gzip": false,
            "user_agent": "ledger-sync/2.1",
            "quotas": {
                "global": { "requests_per_minute": 400, "burst": 8, "max_concurrent": 6 },
                "realm": { "requests_per_minute": 300, "burst": 4, "max_concurrent": 3 },
                "batch": { "requests_per_minute": 20, "burst": 2 }
            }
        }"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.base_url, "https://sandbox-quickbooks.api.intuit.com");
    assert_eq!(config.minor_version, "70");
    assert_eq!(config.timeout_secs, 12);
    assert!(!config.request_gzip);
    assert_eq!(config.user_agent.as_deref(), Some("ledger-sync/2.1"));
    assert_eq!(
        config.quotas.realm,
        LimitConfig { requests_per_minute: 300, burst: 4, max_concurrent: 3 }
    );
    assert_eq!(config.quotas.batch.burst, 2);

    // The loaded configuration builds a client with those limits
    let client = ApiClient::new(config).expect("client should build");
    assert_eq!(client.config().quotas.global.max_concurrent, 6);
}

#[test]
fn test_load_config_from_toml_file() {
    let file = config_file(
        ".toml",
        r#"
base_url = "http://localhost:9090"
timeout_secs = 5

[quotas.realm]
max_concurrent = 2

[quotas.batch]
requests_per_minute = 10
"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.base_url, "http://localhost:9090");
    assert_eq!(config.timeout_secs, 5);
    assert_eq!(config.quotas.realm.max_concurrent, 2);
    assert_eq!(config.quotas.realm.requests_per_minute, 500);
    assert_eq!(config.quotas.batch.requests_per_minute, 10);
    assert_eq!(config.quotas.batch.burst, 5);
    assert_eq!(config.quotas.global, LimitConfig::default());
}

#[test]
fn test_load_config_with_minimal_fields() {
    let file = config_file(".json", "{}");

    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();

    assert_eq!(config.base_url, "https://quickbooks.api.intuit.com");
    assert_eq!(config.minor_version, "75");
    assert!(config.request_gzip);
    assert_eq!(config.user_agent, None);
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/tallyline.json".into()));

    match result {
        Err(TallyError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let file = config_file(".json", r#"{ "base_url": "http://localhost" "#);

    match config::load_from_file(Some(file.path().to_path_buf())) {
        Err(TallyError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_load_config_rejects_zero_limits() {
    let file = config_file(".toml", "[quotas.global]\nmax_concurrent = 0\n");

    match config::load_from_file(Some(file.path().to_path_buf())) {
        Err(TallyError::Config(msg)) => assert!(msg.contains("max_concurrent")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_oversized_concurrency_is_config_error() {
    let file = config_file(
        ".json",
        r#"{ "quotas": { "global": { "max_concurrent": 18446744073709551615 } } }"#,
    );

    match config::load_from_file(Some(file.path().to_path_buf())) {
        Err(TallyError::Config(msg)) => assert!(msg.contains("global.max_concurrent")),
        other => panic!("Expected Config error, got {other:?}"),
    }

    // A client built from such a configuration fails the same way
    let mut client_config = ClientConfig::default();
    client_config.quotas.realm.max_concurrent = usize::MAX;
    match ApiClient::new(client_config) {
        Err(TallyError::Config(msg)) => assert!(msg.contains("realm.max_concurrent")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}
