// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kindred - an always-on AI companion on WhatsApp.
//!
//! Binary entry point.

mod doctor;
mod serve;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

/// Kindred - an always-on AI companion on WhatsApp.
#[derive(Parser, Debug)]
#[command(name = "kindred", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the companion: webhook gateway, agent loop, and adapters.
    Serve,
    /// Check configuration, credentials, and local state.
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match kindred_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            kindred_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Doctor) => doctor::run_doctor(config).await,
        None => {
            println!("kindred: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
