// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mordomo household agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Mordomo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MordomoConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// WhatsApp channel settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// External AI classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Pending confirmation settings.
    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    /// Conversation memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Channel session supervisor settings.
    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Chat id that receives operational alerts. `None` disables alert routing.
    #[serde(default)]
    pub admin_chat_id: Option<String>,

    /// Household timezone offset from UTC, in minutes. Punch times recorded
    /// "now" use this offset. Defaults to UTC-3 (Brasília).
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset_minutes: i32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            admin_chat_id: None,
            timezone_offset_minutes: default_timezone_offset(),
        }
    }
}

fn default_agent_name() -> String {
    "mordomo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone_offset() -> i32 {
    -180
}

/// WhatsApp Cloud API channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Whether the WhatsApp channel is enabled. The supervisor health check
    /// alerts when this is `true` and the session is not connected.
    #[serde(default)]
    pub enabled: bool,

    /// Graph API access token. `None` disables the adapter.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone number id used for sending.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Token echoed back during webhook verification.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret used to validate webhook HMAC signatures.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Address the webhook server binds to.
    #[serde(default = "default_webhook_bind")]
    pub webhook_bind: String,

    /// Graph API base URL. Overridable for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            app_secret: None,
            webhook_bind: default_webhook_bind(),
            api_base: default_api_base(),
        }
    }
}

fn default_webhook_bind() -> String {
    "127.0.0.1:8090".to_string()
}

fn default_api_base() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

/// External AI classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Classifier service endpoint.
    #[serde(default = "default_classifier_url")]
    pub api_url: String,

    /// Bearer token for the classifier service. `None` requires env override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier sent with classification requests.
    #[serde(default = "default_classifier_model")]
    pub model: String,

    /// Upper bound on a single classifier call, in seconds.
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,

    /// Speech transcriptions allowed per hour before failing fast.
    #[serde(default = "default_speech_hourly_limit")]
    pub speech_hourly_limit: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_url: default_classifier_url(),
            api_key: None,
            model: default_classifier_model(),
            timeout_secs: default_classifier_timeout(),
            speech_hourly_limit: default_speech_hourly_limit(),
        }
    }
}

fn default_classifier_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_classifier_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_classifier_timeout() -> u64 {
    30
}

fn default_speech_hourly_limit() -> u32 {
    20
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mordomo").join("mordomo.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "mordomo.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Pending confirmation lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmationConfig {
    /// Minutes before a pending confirmation reads as expired.
    #[serde(default = "default_confirmation_ttl")]
    pub ttl_minutes: i64,

    /// Minimum interval between global expiry sweeps, in minutes. The sweep
    /// is lazy (triggered by reads), this only bounds write amplification.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: i64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_confirmation_ttl(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

fn default_confirmation_ttl() -> i64 {
    30
}

fn default_sweep_interval() -> i64 {
    5
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Maximum entries kept per chat.
    #[serde(default = "default_memory_entries")]
    pub max_entries: usize,

    /// Maximum age of a kept entry, in minutes.
    #[serde(default = "default_memory_age")]
    pub max_age_minutes: i64,

    /// Minimum interval between idle-chat eviction sweeps, in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: i64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_memory_entries(),
            max_age_minutes: default_memory_age(),
            sweep_interval_minutes: default_sweep_interval(),
        }
    }
}

fn default_memory_entries() -> usize {
    10
}

fn default_memory_age() -> i64 {
    10
}

/// Channel session supervisor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Connection attempts per initialize sequence.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between connection attempts, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Interval of the independent health check task, in seconds.
    #[serde(default = "default_health_interval")]
    pub health_check_interval_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
            health_check_interval_secs: default_health_interval(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    30
}

fn default_health_interval() -> u64 {
    300
}
