// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gitpulse - real-time GitHub commit activity service.
//!
//! This is the binary entry point for the Gitpulse daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Gitpulse - real-time GitHub commit activity service.
#[derive(Parser, Debug)]
#[command(name = "gitpulse", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full service: poller, retention, stats, and gateway.
    Serve,
    /// Run a single poll cycle and print the structured outcome.
    Poll,
    /// Recompute the monthly and daily rollups once.
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match gitpulse_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            gitpulse_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::Poll) => serve::run_poll_once(config).await,
        Some(Commands::Stats) => serve::run_stats_once(config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
