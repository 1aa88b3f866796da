// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Mordomo configuration system.

use mordomo_config::diagnostic::ConfigError;
use mordomo_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_mordomo_config() {
    let toml = r#"
[agent]
name = "casa-lima"
log_level = "debug"
admin_chat_id = "5511999990000"
timezone_offset_minutes = -180

[whatsapp]
enabled = true
access_token = "EAAB-token"
phone_number_id = "10987654321"
verify_token = "hub-verify"
app_secret = "app-secret"
webhook_bind = "127.0.0.1:8090"

[classifier]
api_url = "http://localhost:9000/v1"
api_key = "sk-test"
timeout_secs = 10
speech_hourly_limit = 5

[storage]
database_path = "/tmp/mordomo-test.db"
wal_mode = false

[confirmation]
ttl_minutes = 15
sweep_interval_minutes = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "casa-lima");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.agent.admin_chat_id.as_deref(), Some("5511999990000"));
    assert!(config.whatsapp.enabled);
    assert_eq!(config.whatsapp.access_token.as_deref(), Some("EAAB-token"));
    assert_eq!(config.classifier.timeout_secs, 10);
    assert_eq!(config.classifier.speech_hourly_limit, 5);
    assert_eq!(config.storage.database_path, "/tmp/mordomo-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.confirmation.ttl_minutes, 15);
    assert_eq!(config.confirmation.sweep_interval_minutes, 2);
}

/// Unknown field in a section produces an error naming the bad key.
#[test]
fn unknown_field_in_whatsapp_produces_error() {
    let toml = r#"
[whatsapp]
acces_token = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("acces_token"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.agent.name, "mordomo");
    assert_eq!(config.agent.log_level, "info");
    assert!(config.agent.admin_chat_id.is_none());
    assert!(!config.whatsapp.enabled);
    assert_eq!(config.confirmation.ttl_minutes, 30);
    assert_eq!(config.confirmation.sweep_interval_minutes, 5);
    assert_eq!(config.memory.max_entries, 10);
    assert_eq!(config.memory.max_age_minutes, 10);
    assert_eq!(config.supervisor.max_attempts, 3);
    assert_eq!(config.supervisor.retry_delay_secs, 30);
}

/// load_and_validate_str surfaces validation failures as diagnostics.
#[test]
fn validate_rejects_non_positive_ttl() {
    let toml = r#"
[confirmation]
ttl_minutes = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero TTL should fail validation");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("ttl_minutes"))));
}

/// Validation passes for a fully specified, coherent config.
#[test]
fn validate_accepts_complete_config() {
    let toml = r#"
[whatsapp]
enabled = true
access_token = "token"
phone_number_id = "123"
webhook_bind = "0.0.0.0:8090"

[storage]
database_path = "/tmp/m.db"
"#;
    assert!(load_and_validate_str(toml).is_ok());
}
