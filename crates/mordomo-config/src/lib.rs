// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Mordomo household agent.
//!
//! Layered TOML configuration via Figment with `MORDOMO_` environment
//! variable overrides, post-deserialization validation, and miette-rendered
//! diagnostics for unknown keys.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{figment_to_config_errors, render_errors, ConfigError};
pub use loader::{
    load_and_validate, load_and_validate_str, load_config, load_config_from_path,
    load_config_from_str,
};
pub use model::MordomoConfig;
pub use validation::validate_config;
