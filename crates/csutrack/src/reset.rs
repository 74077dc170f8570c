// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `csutrack reset` command implementation.

use csutrack_core::{CsuError, LocalStore, ResetOutcome};

use crate::app::{App, use_color};

/// Destroys and recreates the local store. Works on a store that failed to
/// open, which is the usual reason to run it.
pub async fn run_reset(app: &App, confirmed: bool, plain: bool) -> Result<(), CsuError> {
    use colored::Colorize;

    if !confirmed {
        return Err(CsuError::Validation(
            "reset deletes all unsynced local data; pass --yes to confirm".into(),
        ));
    }

    let _ = app.store.init().await;
    let outcome = app
        .store
        .reset_database("requested from the command line")
        .await?;
    app.store.close().await?;

    let message = match outcome {
        ResetOutcome::Completed => format!("local store recreated at {}", app.store.path().display()),
        ResetOutcome::AlreadyInProgress => "a reset is already in progress".to_string(),
    };
    if use_color(plain) {
        println!("  {}", message.red());
    } else {
        println!("  {message}");
    }
    Ok(())
}
