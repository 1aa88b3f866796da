// SPDX-FileCopyrightText: 2026 Mordomo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mordomo - household staff operations over a conversational chat channel.
//!
//! This is the binary entry point for the Mordomo agent.

mod serve;
mod status;

use clap::{Parser, Subcommand};

/// Mordomo - household staff operations agent.
#[derive(Parser, Debug)]
#[command(name = "mordomo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Mordomo agent.
    Serve,
    /// Report configuration and storage health.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match mordomo_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            mordomo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status) => status::run_status(config).await,
        None => {
            println!("mordomo: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Config loads with defaults when no config file is present.
        let config =
            mordomo_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.agent.name, "mordomo");
    }
}
