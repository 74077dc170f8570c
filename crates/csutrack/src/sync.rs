// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `csutrack sync` command implementation.

use csutrack_core::{CsuError, LocalStore};
use csutrack_sync::{SyncOutcome, SyncReport};

use crate::app::{App, use_color};

/// Runs one drain pass in the foreground and reports it.
pub async fn run_sync(app: &App, json: bool, plain: bool) -> Result<(), CsuError> {
    app.store.init().await?;
    let report = app.service.sync_now().await;
    app.service.shutdown().await?;
    let report = report?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| CsuError::Internal(format!("failed to render report: {e}")))?;
        println!("{rendered}");
    } else {
        print_report(&report, use_color(plain));
    }
    Ok(())
}

fn print_report(report: &SyncReport, color: bool) {
    use colored::Colorize;

    let headline = match report.outcome {
        SyncOutcome::Completed if report.has_failures() => "sync finished with failures",
        SyncOutcome::Completed => "sync finished",
        SyncOutcome::SkippedOffline => "server unreachable; nothing was sent",
        SyncOutcome::SkippedInProgress => "another sync is already running",
        SyncOutcome::StoreReset => "local store was corrupt and has been reset",
    };
    if color {
        let colored = match report.outcome {
            SyncOutcome::Completed if !report.has_failures() => headline.green(),
            SyncOutcome::StoreReset => headline.red(),
            _ => headline.yellow(),
        };
        println!("  {colored}");
    } else {
        println!("  {headline}");
    }

    if report.outcome == SyncOutcome::Completed {
        println!(
            "    entries   {:>4} synced {:>4} failed",
            report.entries_synced, report.entries_failed
        );
        println!(
            "    mutations {:>4} sent   {:>4} failed {:>4} evicted",
            report.items_replayed, report.items_failed, report.items_evicted
        );
    }
}
