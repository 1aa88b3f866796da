// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mordomo status` command implementation.

use mordomo_config::MordomoConfig;
use mordomo_core::error::MordomoError;
use mordomo_core::{HealthStatus, PluginAdapter, RecordStore};
use mordomo_storage::SqliteStore;

/// Prints configuration and storage health.
pub async fn run_status(config: MordomoConfig) -> Result<(), MordomoError> {
    println!("agent:          {}", config.agent.name);
    println!("database:       {}", config.storage.database_path);

    let store = SqliteStore::new(config.storage.clone());
    match store.initialize().await {
        Ok(()) => {
            let health = store.health_check().await?;
            let label = match health {
                HealthStatus::Healthy => "healthy".to_string(),
                HealthStatus::Degraded(reason) => format!("degraded ({reason})"),
                HealthStatus::Unhealthy(reason) => format!("unhealthy ({reason})"),
            };
            println!("storage:        {label}");
            store.close().await?;
        }
        Err(e) => println!("storage:        unavailable ({e})"),
    }

    println!(
        "whatsapp:       {}",
        if config.whatsapp.enabled { "enabled" } else { "disabled" }
    );
    println!("classifier:     {}", config.classifier.api_url);
    println!(
        "confirmations:  ttl {} min, sweep every {} min",
        config.confirmation.ttl_minutes, config.confirmation.sweep_interval_minutes
    );
    println!(
        "supervisor:     {} attempts, {}s apart, health check every {}s",
        config.supervisor.max_attempts,
        config.supervisor.retry_delay_secs,
        config.supervisor.health_check_interval_secs
    );

    Ok(())
}
