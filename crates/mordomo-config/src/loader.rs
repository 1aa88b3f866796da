// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mordomo.toml` > `~/.config/mordomo/mordomo.toml`
//! > `/etc/mordomo/mordomo.toml` with environment variable overrides via
//! `MORDOMO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::diagnostic::{figment_to_config_errors, ConfigError};
use crate::model::MordomoConfig;
use crate::validation::validate_config;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mordomo/mordomo.toml` (system-wide)
/// 3. `~/.config/mordomo/mordomo.toml` (user XDG config)
/// 4. `./mordomo.toml` (local directory)
/// 5. `MORDOMO_*` environment variables
pub fn load_config() -> Result<MordomoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MordomoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MordomoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load from the standard hierarchy, convert figment errors to diagnostics,
/// and run post-deserialization validation.
pub fn load_and_validate() -> Result<MordomoConfig, Vec<ConfigError>> {
    let config = load_config().map_err(figment_to_config_errors)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load a TOML string, convert figment errors to diagnostics, and run
/// post-deserialization validation.
pub fn load_and_validate_str(toml_content: &str) -> Result<MordomoConfig, Vec<ConfigError>> {
    let config = load_config_from_str(toml_content).map_err(figment_to_config_errors)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MordomoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MordomoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MordomoConfig::default()))
        .merge(Toml::file("/etc/mordomo/mordomo.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("mordomo/mordomo.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("mordomo.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MORDOMO_WHATSAPP_ACCESS_TOKEN` must map
/// to `whatsapp.access_token`, not `whatsapp.access.token`.
fn env_provider() -> Env {
    Env::prefixed("MORDOMO_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("classifier_", "classifier.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("confirmation_", "confirmation.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("supervisor_", "supervisor.", 1);
        mapped.into()
    })
}
