// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `csutrack status` command implementation.
//!
//! Opens the local store read-mostly and prints its counts together with
//! the result of the startup reachability probe.

use serde::Serialize;

use csutrack_core::{CsuError, HealthStatus, LocalStore, PluginAdapter, StoreStats};

use crate::app::{App, use_color};

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub online: bool,
    pub server_url: String,
    pub database_path: String,
    pub store: String,
    pub entries: u64,
    pub unsynced_entries: u64,
    pub queued: u64,
    pub dead_letters: u64,
}

impl StatusResponse {
    fn new(app: &App, store: &HealthStatus, stats: StoreStats) -> Self {
        Self {
            online: app.is_online(),
            server_url: app.config.sync.server_url.clone(),
            database_path: app.store.path().display().to_string(),
            store: health_label(store),
            entries: stats.entries,
            unsynced_entries: stats.unsynced_entries,
            queued: stats.queued,
            dead_letters: stats.dead_letters,
        }
    }
}

fn health_label(status: &HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "healthy".into(),
        HealthStatus::Degraded(reason) => format!("degraded: {reason}"),
        HealthStatus::Unhealthy(reason) => format!("unavailable: {reason}"),
    }
}

pub async fn run_status(app: &App, json: bool, plain: bool) -> Result<(), CsuError> {
    // An unavailable store is reported, not treated as a command failure.
    let _ = app.store.init().await;
    let health = app.store.health_check().await?;
    let stats = match health {
        HealthStatus::Unhealthy(_) => StoreStats::default(),
        _ => app.store.stats().await?,
    };
    let response = StatusResponse::new(app, &health, stats);
    app.store.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_status(&response, use_color(plain));
    }
    Ok(())
}

fn print_status(status: &StatusResponse, color: bool) {
    use colored::Colorize;

    let connectivity = match (status.online, color) {
        (true, true) => "online".green().to_string(),
        (false, true) => "offline".yellow().to_string(),
        (true, false) => "online".to_string(),
        (false, false) => "offline".to_string(),
    };

    println!();
    println!("  csutrack status");
    println!("  {}", "-".repeat(50));
    println!("    {:<18} {connectivity} ({})", "Server", status.server_url);
    println!("    {:<18} {} ({})", "Local store", status.store, status.database_path);
    println!("    {:<18} {}", "Entries", status.entries);
    println!("    {:<18} {}", "Unsynced entries", status.unsynced_entries);
    println!("    {:<18} {}", "Queued mutations", status.queued);
    if status.dead_letters > 0 && color {
        println!(
            "    {:<18} {}",
            "Dead letters",
            status.dead_letters.to_string().red()
        );
    } else {
        println!("    {:<18} {}", "Dead letters", status.dead_letters);
    }
    println!();
}
