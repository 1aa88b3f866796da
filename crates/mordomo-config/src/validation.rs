// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive intervals and a parseable webhook address.

use crate::diagnostic::ConfigError;
use crate::model::MordomoConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MordomoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.confirmation.ttl_minutes <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "confirmation.ttl_minutes must be positive, got {}",
                config.confirmation.ttl_minutes
            ),
        });
    }

    if config.confirmation.sweep_interval_minutes <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "confirmation.sweep_interval_minutes must be positive, got {}",
                config.confirmation.sweep_interval_minutes
            ),
        });
    }

    if config.classifier.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "classifier.timeout_secs must be positive".to_string(),
        });
    }

    if config.supervisor.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "supervisor.max_attempts must be at least 1".to_string(),
        });
    }

    if config.memory.max_entries == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.max_entries must be at least 1".to_string(),
        });
    }

    if config.whatsapp.enabled {
        if config.whatsapp.access_token.is_none() {
            errors.push(ConfigError::Validation {
                message: "whatsapp.access_token is required when whatsapp.enabled".to_string(),
            });
        }
        if config.whatsapp.phone_number_id.is_none() {
            errors.push(ConfigError::Validation {
                message: "whatsapp.phone_number_id is required when whatsapp.enabled".to_string(),
            });
        }
        if config.whatsapp.webhook_bind.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "whatsapp.webhook_bind `{}` is not a valid socket address",
                    config.whatsapp.webhook_bind
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
