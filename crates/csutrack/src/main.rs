// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! csutrack - offline-first sync layer for the CSU symptom tracker.
//!
//! This is the binary entry point: it loads configuration, wires the local
//! store, HTTP transport and offline service, and runs one command.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod log;
mod queue;
mod reset;
mod status;
mod sync;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use csutrack_config::CsuConfig;

use crate::app::App;

/// csutrack - offline-first sync for the CSU symptom tracker.
#[derive(Parser, Debug)]
#[command(name = "csutrack", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show local store counts and server reachability.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Record a daily entry, queueing it when the server is unreachable.
    Log(LogArgs),
    /// Run one sync pass and report what was sent.
    Sync {
        #[arg(long)]
        json: bool,
    },
    /// List queued mutations and dead-lettered items.
    Queue,
    /// Delete and recreate the local store. Unsynced data is lost.
    Reset {
        /// Confirm the destructive reset.
        #[arg(long)]
        yes: bool,
    },
    /// Print the resolved configuration.
    Config,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Day being logged (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Itch intensity, 0-3.
    #[arg(long, default_value_t = 0)]
    pub itch: u8,

    /// Hive count score, 0-3.
    #[arg(long, default_value_t = 0)]
    pub hives: u8,

    /// Overall score. Defaults to itch + hives.
    #[arg(long)]
    pub score: Option<u32>,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Suspected trigger; repeat for several.
    #[arg(long = "trigger")]
    pub triggers: Vec<String>,

    /// Quality-of-life answer as `name=value`; repeatable.
    #[arg(long = "qol")]
    pub qol: Vec<String>,

    /// Treat the server as unreachable without probing it.
    #[arg(long)]
    pub offline: bool,
}

fn load_config(path: Option<&std::path::Path>) -> CsuConfig {
    let result = match path {
        Some(path) => csutrack_config::load_and_validate_path(path),
        None => csutrack_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            csutrack_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("csutrack={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    init_tracing(&config.app.log_level);

    let result = match cli.command {
        Some(Commands::Status { json }) => match App::build(config, false).await {
            Ok(app) => status::run_status(&app, json, cli.plain).await,
            Err(e) => Err(e),
        },
        Some(Commands::Log(args)) => match App::build(config, args.offline).await {
            Ok(app) => log::run_log(&app, &args, cli.plain).await,
            Err(e) => Err(e),
        },
        Some(Commands::Sync { json }) => match App::build(config, false).await {
            Ok(app) => sync::run_sync(&app, json, cli.plain).await,
            Err(e) => Err(e),
        },
        Some(Commands::Queue) => match App::build(config, true).await {
            Ok(app) => queue::run_queue(&app, cli.plain).await,
            Err(e) => Err(e),
        },
        Some(Commands::Reset { yes }) => match App::build(config, true).await {
            Ok(app) => reset::run_reset(&app, yes, cli.plain).await,
            Err(e) => Err(e),
        },
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                print!("{rendered}");
                Ok(())
            }
            Err(e) => Err(csutrack_core::CsuError::Internal(format!(
                "failed to render configuration: {e}"
            ))),
        },
        None => {
            println!("csutrack: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("csutrack: {e}");
        std::process::exit(1);
    }
}
